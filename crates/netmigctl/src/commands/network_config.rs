//! patch-network: drop the old provider config and clean up its namespace.

use super::timed_out_detail;
use crate::oc::Oc;
use netmig_common::{ConditionSpec, PollDriver, PollError, PollSettings, ProbeExecutor, StepReport};
use tracing::info;

/// What patch-network should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    /// Key under `spec.defaultNetwork` to null out, e.g. `openshiftSDNConfig`
    pub provider_config: String,
    /// Namespace to delete after the patch
    pub namespace: Option<String>,
    /// Report the commands without running them
    pub dry_run: bool,
}

/// Apply the merge patch, then delete the namespace if one was given.
///
/// Both mutations retry on non-zero exit until the budget runs out. A
/// failed delete after a successful patch is reported as a failure with
/// `changed` set; nothing is rolled back.
pub async fn patch_network<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    settings: PollSettings,
    plan: &PatchPlan,
) -> Result<StepReport, PollError> {
    let patch = oc.patch_default_network(&plan.provider_config);
    let delete = plan.namespace.as_deref().map(|ns| oc.delete_namespace(ns));

    if plan.dry_run {
        let mut steps = vec![patch.to_string()];
        steps.extend(delete.iter().map(|d| d.to_string()));
        return Ok(StepReport::success(format!("Dry run, would run: {}", steps.join(" && "))));
    }

    let driver = PollDriver::new(executor, settings);

    info!("Patching {} out of the network operator", plan.provider_config);
    let outcome = driver.poll(&patch, &ConditionSpec::Succeeded).await?;
    if !outcome.is_matched() {
        return Ok(StepReport::failure(format!(
            "Failed to patch the network operator configuration: {}",
            timed_out_detail(&outcome)
        )));
    }

    if let (Some(namespace), Some(delete)) = (plan.namespace.as_deref(), delete) {
        info!("Deleting namespace {}", namespace);
        let outcome = driver.poll(&delete, &ConditionSpec::Succeeded).await?;
        if !outcome.is_matched() {
            return Ok(StepReport::failure(format!(
                "Network configuration updated but deleting namespace {} failed: {}",
                namespace,
                timed_out_detail(&outcome)
            ))
            .with_changed(true));
        }
    }

    Ok(
        StepReport::success("Network configuration updated and namespace deleted if provided.")
            .with_changed(true),
    )
}
