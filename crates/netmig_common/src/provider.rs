//! Cluster network providers and their boot configuration markers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network plugin a cluster migrates between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkProvider {
    #[serde(rename = "OVNKubernetes")]
    OvnKubernetes,
    #[serde(rename = "OpenShiftSDN")]
    OpenShiftSdn,
}

impl NetworkProvider {
    pub const ALL: [NetworkProvider; 2] = [Self::OvnKubernetes, Self::OpenShiftSdn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OvnKubernetes => "OVNKubernetes",
            Self::OpenShiftSdn => "OpenShiftSDN",
        }
    }

    /// Line a rendered machine config carries when this provider is active.
    pub fn boot_marker(&self) -> &'static str {
        match self {
            Self::OvnKubernetes => "ExecStart=/usr/local/bin/configure-ovs.sh OVNKubernetes",
            Self::OpenShiftSdn => "ExecStart=/usr/local/bin/configure-ovs.sh OpenShiftSDN",
        }
    }
}

impl fmt::Display for NetworkProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown network provider '{}' (expected OVNKubernetes or OpenShiftSDN)",
                    s
                )
            })
    }
}
