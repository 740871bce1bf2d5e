//! verify-machine-config: every node runs the rendered config for the new provider.
//!
//! First the node rollout is polled until every node reports `Done` with
//! matching current and desired configs. Then each node is checked on its
//! own, including a nested poll that looks for the provider's ExecStart
//! marker in the node's current rendered config. On timeout the last
//! observed records are still checked so the report names every lagging
//! node.

use super::timed_out_detail;
use crate::oc::Oc;
use netmig_common::records::PHASE_DONE;
use netmig_common::{
    aggregate, parse_records, ConditionSpec, EntityIssue, Extracted, NetworkProvider, NodeRecord,
    PollDriver, PollError, PollOutcome, PollSettings, ProbeExecutor, StepReport,
};
use tracing::{info, warn};

pub async fn verify_machine_config<E: ProbeExecutor + ?Sized>(
    executor: &E,
    oc: &Oc,
    rollout: PollSettings,
    marker: PollSettings,
    provider: NetworkProvider,
) -> Result<StepReport, PollError> {
    info!("Verifying machine config rollout for {}", provider);

    let outcome = PollDriver::new(executor, rollout)
        .poll(&oc.describe_nodes(), &ConditionSpec::MultiRecordExtract)
        .await?;

    let records = match &outcome {
        PollOutcome::Matched {
            value: Extracted::Records(records),
            ..
        } => records.clone(),
        PollOutcome::TimedOut {
            last_payload: Some(payload),
            ..
        } => parse_records(payload),
        _ => Vec::new(),
    };

    if records.is_empty() {
        return Ok(StepReport::failure(format!(
            "No node machine config status could be read: {}",
            timed_out_detail(&outcome)
        )));
    }

    let marker_driver = PollDriver::new(executor, marker);
    let driver = &marker_driver;
    let issues = aggregate(&records, |node| {
        let node = node.clone();
        async move { check_node(driver, oc, &node, provider).await }
    })
    .await?;

    if issues.is_empty() {
        Ok(StepReport::success("All machine configurations are correct."))
    } else {
        warn!("{} machine config issue(s) found", issues.len());
        Ok(StepReport::failure("Issues detected with machine configuration.").with_issues(issues))
    }
}

async fn check_node<E: ProbeExecutor + ?Sized>(
    driver: &PollDriver<'_, E>,
    oc: &Oc,
    node: &NodeRecord,
    provider: NetworkProvider,
) -> Result<Vec<EntityIssue>, PollError> {
    let mut issues = Vec::new();

    if node.phase != PHASE_DONE {
        issues.push(EntityIssue::new(
            &node.identity,
            format!("Node {} state is {}, not Done.", node.identity, node.phase),
        ));
    }

    if node.current_state != node.desired_state {
        issues.push(EntityIssue::new(
            &node.identity,
            format!(
                "Node {} currentConfig ({}) does not match desiredConfig ({}).",
                node.identity, node.current_state, node.desired_state
            ),
        ));
    }

    let condition = ConditionSpec::Contains {
        needle: provider.boot_marker().to_string(),
    };
    let outcome = driver
        .poll(&oc.get_machine_config(&node.current_state), &condition)
        .await?;
    if !outcome.is_matched() {
        issues.push(EntityIssue::new(
            &node.identity,
            format!(
                "Node {} configuration {} does not contain expected ExecStart.",
                node.identity, node.current_state
            ),
        ));
    }

    Ok(issues)
}
