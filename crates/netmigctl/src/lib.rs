//! netmigctl - network-provider migration steps built on netmig_common.

pub mod commands;
pub mod oc;
