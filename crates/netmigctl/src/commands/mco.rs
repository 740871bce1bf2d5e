//! wait-mco: wait for every machine config pool to settle.

use super::timed_out_detail;
use crate::oc::Oc;
use netmig_common::{ConditionSpec, PollDriver, PollError, PollSettings, ProbeExecutor, StepReport};
use tracing::info;

/// Settled means UPDATED=True, UPDATING=False and DEGRADED=False on all
/// pools in the same attempt.
pub async fn wait_for_mco<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    settings: PollSettings,
) -> Result<StepReport, PollError> {
    info!("Waiting for machine config pools to settle");

    let outcome = PollDriver::new(executor, settings)
        .poll_all(&oc.wait_machine_config_pools(), &ConditionSpec::Succeeded)
        .await?;

    Ok(if outcome.is_matched() {
        StepReport::success("MCO finished successfully.")
    } else {
        StepReport::failure(format!(
            "Timeout reached while waiting for MCO to finish: {}",
            timed_out_detail(&outcome)
        ))
    })
}
