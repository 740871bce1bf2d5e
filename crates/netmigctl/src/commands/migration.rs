//! check-migration: the declared migration network type.

use super::{observed_at, timed_out_detail};
use crate::oc::Oc;
use netmig_common::{ConditionSpec, PollDriver, PollError, PollSettings, ProbeExecutor, StepReport};
use tracing::info;

pub const MIGRATION_TYPE_PATH: &str = "status.migration.networkType";

pub async fn check_migration<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    settings: PollSettings,
    expected: &str,
) -> Result<StepReport, PollError> {
    info!("Checking migration network type, expecting '{}'", expected);

    let condition = ConditionSpec::PathExtract {
        path: MIGRATION_TYPE_PATH.to_string(),
        expected: expected.to_string(),
    };
    let outcome = PollDriver::new(executor, settings)
        .poll(&oc.get_network_config(), &condition)
        .await?;

    if outcome.is_matched() {
        return Ok(StepReport::success(format!(
            "Network migration type is correctly set to '{}'.",
            expected
        ))
        .with_value(expected));
    }

    Ok(match observed_at(&outcome, MIGRATION_TYPE_PATH) {
        Some(actual) => StepReport::failure(format!(
            "Network migration type is '{}', expected '{}'.",
            actual, expected
        ))
        .with_value(actual),
        None => StepReport::failure(format!(
            "Failed to retrieve network config: {}",
            timed_out_detail(&outcome)
        )),
    })
}
