//! wait-network-co: wait for the network cluster operator to start progressing.

use super::timed_out_detail;
use crate::oc::Oc;
use netmig_common::{ConditionSpec, PollDriver, PollError, PollSettings, ProbeExecutor, StepReport};

pub async fn wait_for_network_co<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    settings: PollSettings,
) -> Result<StepReport, PollError> {
    let outcome = PollDriver::new(executor, settings)
        .poll(
            &oc.wait_network_operator_progressing(),
            &ConditionSpec::Succeeded,
        )
        .await?;

    Ok(if outcome.is_matched() {
        StepReport::success("Network Cluster Operator is in PROGRESSING=True state.")
    } else {
        StepReport::failure(format!(
            "Timeout waiting for Network Cluster Operator to reach PROGRESSING=True: {}",
            timed_out_detail(&outcome)
        ))
    })
}
