//! check-provider: wait for the cluster to report the expected network type.

use super::{observed_at, timed_out_detail};
use crate::oc::Oc;
use netmig_common::{ConditionSpec, PollDriver, PollError, PollSettings, ProbeExecutor, StepReport};
use tracing::info;

pub const NETWORK_TYPE_PATH: &str = "status.networkType";

pub async fn check_provider<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    settings: PollSettings,
    expected: &str,
) -> Result<StepReport, PollError> {
    info!("Waiting for network provider {}", expected);

    let condition = ConditionSpec::PathExtract {
        path: NETWORK_TYPE_PATH.to_string(),
        expected: expected.to_string(),
    };
    let outcome = PollDriver::new(executor, settings)
        .poll(&oc.get_cluster_network(), &condition)
        .await?;

    if outcome.is_matched() {
        return Ok(StepReport::success(format!(
            "The current network provider is {}, as expected.",
            expected
        ))
        .with_value(expected));
    }

    Ok(match observed_at(&outcome, NETWORK_TYPE_PATH) {
        Some(actual) => StepReport::failure(format!(
            "Expected network provider {}, but found {}.",
            expected, actual
        ))
        .with_value(actual),
        None => StepReport::failure(format!(
            "Timed out reading the network provider: {}",
            timed_out_detail(&outcome)
        )),
    })
}
