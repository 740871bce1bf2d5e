//! Migration steps.
//!
//! Each step builds its probes, runs them through the poll driver and turns
//! the terminal outcome into a `StepReport`. Execution faults and payload
//! parse errors are returned as `PollError` for the caller to report.

mod machine_config;
mod mco;
mod migration;
mod network_config;
mod network_co;
mod provider;

pub use machine_config::verify_machine_config;
pub use mco::wait_for_mco;
pub use migration::check_migration;
pub use network_config::{patch_network, PatchPlan};
pub use network_co::wait_for_network_co;
pub use provider::check_provider;

use netmig_common::condition::extract_path;
use netmig_common::PollOutcome;

/// Last diagnostic of a timed-out poll.
fn timed_out_detail(outcome: &PollOutcome) -> &str {
    match outcome {
        PollOutcome::TimedOut { diagnostic, .. } => diagnostic,
        PollOutcome::Matched { .. } => "",
    }
}

/// Value at `path` in the last payload a timed-out poll observed.
fn observed_at(outcome: &PollOutcome, path: &str) -> Option<String> {
    match outcome {
        PollOutcome::TimedOut {
            last_payload: Some(payload),
            ..
        } => serde_json::from_str::<serde_json::Value>(payload)
            .ok()
            .map(|doc| extract_path(&doc, path)),
        _ => None,
    }
}
