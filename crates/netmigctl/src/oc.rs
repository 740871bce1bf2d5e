//! `oc` command lines used by the migration steps.

use netmig_common::ProbeRequest;
use serde_json::json;

/// Builds probes against one `oc` binary
#[derive(Debug, Clone)]
pub struct Oc {
    binary: String,
}

impl Oc {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn argv<const N: usize>(&self, args: [&str; N]) -> ProbeRequest {
        ProbeRequest::argv(&self.binary, args)
    }

    pub fn get_network_config(&self) -> ProbeRequest {
        self.argv(["get", "Network.config", "cluster", "-o", "json"])
    }

    pub fn get_cluster_network(&self) -> ProbeRequest {
        self.argv(["get", "network.config/cluster", "-o", "json"])
    }

    /// Merge patch that nulls out one provider section of the operator config
    pub fn patch_default_network(&self, provider_config: &str) -> ProbeRequest {
        let patch = json!({
            "spec": {
                "defaultNetwork": {
                    provider_config: null
                }
            }
        });
        ProbeRequest::argv(
            &self.binary,
            [
                "patch".to_string(),
                "Network.operator.openshift.io".to_string(),
                "cluster".to_string(),
                "--type=merge".to_string(),
                "--patch".to_string(),
                patch.to_string(),
            ],
        )
    }

    pub fn delete_namespace(&self, namespace: &str) -> ProbeRequest {
        self.argv(["delete", "namespace", namespace, "--ignore-not-found"])
    }

    /// Full node descriptions; the record parser skips unrelated lines
    pub fn describe_nodes(&self) -> ProbeRequest {
        self.argv(["describe", "node"])
    }

    /// Rendered machine config as YAML. `config_name` comes from node
    /// annotations and is passed as a single argument.
    pub fn get_machine_config(&self, config_name: &str) -> ProbeRequest {
        self.argv(["get", "machineconfig", config_name, "-o", "yaml"])
    }

    /// The three pool conditions that mean the MCO has settled
    pub fn wait_machine_config_pools(&self) -> Vec<ProbeRequest> {
        [
            "--for=condition=UPDATED=True",
            "--for=condition=UPDATING=False",
            "--for=condition=DEGRADED=False",
        ]
        .into_iter()
        .map(|condition| self.argv(["wait", "mcp", "--all", condition, "--timeout=60s"]))
        .collect()
    }

    pub fn wait_network_operator_progressing(&self) -> ProbeRequest {
        self.argv([
            "wait",
            "co",
            "network",
            "--for=condition=PROGRESSING=True",
            "--timeout=60s",
        ])
    }
}

impl Default for Oc {
    fn default() -> Self {
        Self::new("oc")
    }
}
