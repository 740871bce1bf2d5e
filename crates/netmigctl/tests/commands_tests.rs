//! Step-level tests for netmigctl
//!
//! Steps run against FakeProbeExecutor on paused tokio time, so the poll
//! loops finish instantly while still counting real delays. A few tests
//! spawn real processes to check how `oc` is invoked.

use netmig_common::{
    ExecutionFault, FakeProbeExecutor, FakeResponse, NetworkProvider, PollError, PollSettings,
    ProbeExecutor, ProbeStatus, RealProbeExecutor,
};
use netmigctl::commands::{
    check_migration, check_provider, patch_network, verify_machine_config, wait_for_mco,
    wait_for_network_co, PatchPlan,
};
use netmigctl::oc::Oc;
use std::time::Duration;

const GET_NETWORK_CONFIG: &str = "oc get Network.config cluster -o json";
const GET_CLUSTER_NETWORK: &str = "oc get network.config/cluster -o json";
const DESCRIBE_NODES: &str = "oc describe node";
const DELETE_SDN_NS: &str = "oc delete namespace openshift-sdn --ignore-not-found";

const OVN_MARKER_YAML: &str =
    "            ExecStart=/usr/local/bin/configure-ovs.sh OVNKubernetes";

fn settings(timeout_secs: u64, delay_secs: u64) -> PollSettings {
    PollSettings::new(
        Duration::from_secs(timeout_secs),
        Duration::from_secs(delay_secs),
    )
}

fn exec_start_cmd(config: &str) -> String {
    format!("oc get machineconfig {} -o yaml", config)
}

fn node_block(host: &str, current: &str, desired: &str, state: &str) -> String {
    format!(
        "                    kubernetes.io/hostname={}\n\
         \x20                   machineconfiguration.openshift.io/currentConfig: {}\n\
         \x20                   machineconfiguration.openshift.io/desiredConfig: {}\n\
         \x20                   machineconfiguration.openshift.io/state: {}\n",
        host, current, desired, state
    )
}

fn patch_cmd(oc: &Oc, provider_config: &str) -> String {
    oc.patch_default_network(provider_config).to_string()
}

// ============================================================================
// check-migration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_check_migration_matches() {
    let fake = FakeProbeExecutor::new().respond(
        GET_NETWORK_CONFIG,
        FakeResponse::ok(r#"{"status":{"migration":{"networkType":"OVNKubernetes"}}}"#),
    );

    let report = check_migration(&fake, &Oc::default(), settings(60, 3), "OVNKubernetes")
        .await
        .unwrap();

    assert!(!report.failed);
    assert!(!report.changed);
    assert_eq!(report.value.as_deref(), Some("OVNKubernetes"));
    assert_eq!(
        report.msg,
        "Network migration type is correctly set to 'OVNKubernetes'."
    );
}

#[tokio::test(start_paused = true)]
async fn test_check_migration_mismatch_reports_observed_value() {
    let fake = FakeProbeExecutor::new().respond(
        GET_NETWORK_CONFIG,
        FakeResponse::ok(r#"{"status":{"migration":{"networkType":"OVNKubernetes"}}}"#),
    );

    let report = check_migration(
        &fake,
        &Oc::default(),
        settings(60, 3).with_max_attempts(3),
        "OpenShiftSDN",
    )
    .await
    .unwrap();

    assert!(report.failed);
    assert_eq!(report.value.as_deref(), Some("OVNKubernetes"));
    assert_eq!(
        report.msg,
        "Network migration type is 'OVNKubernetes', expected 'OpenShiftSDN'."
    );
    assert_eq!(fake.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_check_migration_malformed_json_fails_immediately() {
    let fake = FakeProbeExecutor::new()
        .respond(GET_NETWORK_CONFIG, FakeResponse::ok("this is not json"));

    let err = check_migration(&fake, &Oc::default(), settings(600, 3), "OVNKubernetes")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to parse output"));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(fake.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_check_migration_unreachable_api() {
    let fake = FakeProbeExecutor::new().respond(
        GET_NETWORK_CONFIG,
        FakeResponse::fail(1, "Unable to connect to the server: dial tcp: i/o timeout"),
    );

    let report = check_migration(
        &fake,
        &Oc::default(),
        settings(60, 3).with_max_attempts(3),
        "OVNKubernetes",
    )
    .await
    .unwrap();

    assert!(report.failed);
    assert_eq!(report.value, None);
    assert_eq!(
        report.msg,
        "Failed to retrieve network config: Unable to connect to the server: dial tcp: i/o timeout"
    );
}

// ============================================================================
// check-provider
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_check_provider_waits_for_rollover() {
    let fake = FakeProbeExecutor::new()
        .respond(
            GET_CLUSTER_NETWORK,
            FakeResponse::ok(r#"{"status":{"networkType":"OpenShiftSDN"}}"#),
        )
        .respond(
            GET_CLUSTER_NETWORK,
            FakeResponse::ok(r#"{"status":{"networkType":"OpenShiftSDN"}}"#),
        )
        .respond(
            GET_CLUSTER_NETWORK,
            FakeResponse::ok(r#"{"status":{"networkType":"OVNKubernetes"}}"#),
        );

    let report = check_provider(&fake, &Oc::default(), settings(120, 3), "OVNKubernetes")
        .await
        .unwrap();

    assert!(!report.failed);
    assert_eq!(
        report.msg,
        "The current network provider is OVNKubernetes, as expected."
    );
    assert_eq!(fake.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_check_provider_timeout() {
    let fake = FakeProbeExecutor::new().respond(
        GET_CLUSTER_NETWORK,
        FakeResponse::ok(r#"{"status":{"networkType":"OpenShiftSDN"}}"#),
    );

    let report = check_provider(&fake, &Oc::default(), settings(12, 3), "OVNKubernetes")
        .await
        .unwrap();

    assert!(report.failed);
    assert_eq!(
        report.msg,
        "Expected network provider OVNKubernetes, but found OpenShiftSDN."
    );
    assert_eq!(fake.total_calls(), 4);
}

// ============================================================================
// patch-network
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_patch_network_then_delete_namespace() {
    let oc = Oc::default();
    let fake = FakeProbeExecutor::new()
        .respond(
            &patch_cmd(&oc, "openshiftSDNConfig"),
            FakeResponse::fail(1, "Operation cannot be fulfilled: the object has been modified"),
        )
        .respond(
            &patch_cmd(&oc, "openshiftSDNConfig"),
            FakeResponse::ok("network.operator.openshift.io/cluster patched"),
        )
        .respond(
            DELETE_SDN_NS,
            FakeResponse::ok("namespace \"openshift-sdn\" deleted"),
        );
    let plan = PatchPlan {
        provider_config: "openshiftSDNConfig".to_string(),
        namespace: Some("openshift-sdn".to_string()),
        dry_run: false,
    };

    let report = patch_network(&fake, &oc, settings(120, 3), &plan)
        .await
        .unwrap();

    assert!(!report.failed);
    assert!(report.changed);
    assert_eq!(
        fake.calls(),
        vec![
            patch_cmd(&oc, "openshiftSDNConfig"),
            patch_cmd(&oc, "openshiftSDNConfig"),
            DELETE_SDN_NS.to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_patch_network_failed_patch_skips_delete() {
    let oc = Oc::default();
    let fake = FakeProbeExecutor::new().respond(
        &patch_cmd(&oc, "openshiftSDNConfig"),
        FakeResponse::fail(1, "Forbidden"),
    );
    let plan = PatchPlan {
        provider_config: "openshiftSDNConfig".to_string(),
        namespace: Some("openshift-sdn".to_string()),
        dry_run: false,
    };

    let report = patch_network(&fake, &oc, settings(9, 3), &plan)
        .await
        .unwrap();

    assert!(report.failed);
    assert!(!report.changed);
    assert!(report.msg.ends_with("Forbidden"));
    assert_eq!(fake.call_count(DELETE_SDN_NS), 0);
}

#[tokio::test(start_paused = true)]
async fn test_patch_network_failed_delete_is_changed_failure() {
    let oc = Oc::default();
    let fake = FakeProbeExecutor::new()
        .respond(
            &patch_cmd(&oc, "openshiftSDNConfig"),
            FakeResponse::ok("patched"),
        )
        .respond(
            DELETE_SDN_NS,
            FakeResponse::fail(1, "etcdserver: request timed out"),
        );
    let plan = PatchPlan {
        provider_config: "openshiftSDNConfig".to_string(),
        namespace: Some("openshift-sdn".to_string()),
        dry_run: false,
    };

    let report = patch_network(&fake, &oc, settings(9, 3), &plan)
        .await
        .unwrap();

    assert!(report.failed);
    assert!(report.changed);
    assert!(report.msg.contains("openshift-sdn"));
}

#[tokio::test(start_paused = true)]
async fn test_patch_network_dry_run_runs_nothing() {
    let fake = FakeProbeExecutor::new();
    let plan = PatchPlan {
        provider_config: "ovnKubernetesConfig".to_string(),
        namespace: None,
        dry_run: true,
    };

    let report = patch_network(&fake, &Oc::default(), settings(120, 3), &plan)
        .await
        .unwrap();

    assert!(!report.failed);
    assert!(!report.changed);
    assert!(report.msg.contains("ovnKubernetesConfig"));
    assert_eq!(fake.total_calls(), 0);
}

// ============================================================================
// verify-machine-config
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_verify_machine_config_all_correct() {
    let nodes = format!(
        "{}{}",
        node_block("master-0", "rendered-master-1", "rendered-master-1", "Done"),
        node_block("worker-0", "rendered-worker-1", "rendered-worker-1", "Done"),
    );
    let fake = FakeProbeExecutor::new()
        .respond(DESCRIBE_NODES, FakeResponse::ok(&nodes))
        .respond(
            &exec_start_cmd("rendered-master-1"),
            FakeResponse::ok(OVN_MARKER_YAML),
        )
        .respond(
            &exec_start_cmd("rendered-worker-1"),
            FakeResponse::ok(OVN_MARKER_YAML),
        );

    let report = verify_machine_config(
        &fake,
        &Oc::default(),
        settings(300, 10),
        settings(300, 3),
        NetworkProvider::OvnKubernetes,
    )
    .await
    .unwrap();

    assert!(!report.failed);
    assert!(report.issues.is_empty());
    assert_eq!(report.msg, "All machine configurations are correct.");
    assert_eq!(fake.call_count(DESCRIBE_NODES), 1);
}

#[tokio::test(start_paused = true)]
async fn test_verify_machine_config_reports_lagging_node() {
    let nodes = format!(
        "{}{}",
        node_block("worker-0", "rendered-worker-2", "rendered-worker-2", "Done"),
        node_block("worker-1", "rendered-worker-2", "rendered-worker-2", "Updating"),
    );
    let fake = FakeProbeExecutor::new()
        .respond(DESCRIBE_NODES, FakeResponse::ok(&nodes))
        .respond(
            &exec_start_cmd("rendered-worker-2"),
            FakeResponse::ok(OVN_MARKER_YAML),
        );

    let report = verify_machine_config(
        &fake,
        &Oc::default(),
        settings(30, 10),
        settings(30, 3),
        NetworkProvider::OvnKubernetes,
    )
    .await
    .unwrap();

    assert!(report.failed);
    assert_eq!(report.msg, "Issues detected with machine configuration.");
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].entity_id, "worker-1");
    assert_eq!(
        report.issues[0].description,
        "Node worker-1 state is Updating, not Done."
    );
    // Rollout polled the full budget: attempts at 0s, 10s and 20s
    assert_eq!(fake.call_count(DESCRIBE_NODES), 3);
}

#[tokio::test(start_paused = true)]
async fn test_verify_machine_config_missing_marker_and_drift() {
    let nodes = node_block("worker-0", "rendered-worker-old", "rendered-worker-new", "Done");
    let sdn_yaml = "ExecStart=/usr/local/bin/configure-ovs.sh OpenShiftSDN";
    let fake = FakeProbeExecutor::new()
        .respond(DESCRIBE_NODES, FakeResponse::ok(&nodes))
        .respond(
            &exec_start_cmd("rendered-worker-old"),
            FakeResponse::ok(sdn_yaml),
        );

    let report = verify_machine_config(
        &fake,
        &Oc::default(),
        settings(20, 10),
        settings(9, 3),
        NetworkProvider::OvnKubernetes,
    )
    .await
    .unwrap();

    assert!(report.failed);
    let descriptions: Vec<&str> = report
        .issues
        .iter()
        .map(|i| i.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec![
            "Node worker-0 currentConfig (rendered-worker-old) does not match desiredConfig (rendered-worker-new).",
            "Node worker-0 configuration rendered-worker-old does not contain expected ExecStart.",
        ]
    );
    // Nested marker poll keeps its own budget: attempts at 0s, 3s and 6s
    assert_eq!(fake.call_count(&exec_start_cmd("rendered-worker-old")), 3);
}

#[tokio::test(start_paused = true)]
async fn test_verify_machine_config_no_records() {
    let fake = FakeProbeExecutor::new().respond(
        DESCRIBE_NODES,
        FakeResponse::fail(1, "error: You must be logged in to the server (Unauthorized)"),
    );

    let report = verify_machine_config(
        &fake,
        &Oc::default(),
        settings(20, 10),
        settings(9, 3),
        NetworkProvider::OpenShiftSdn,
    )
    .await
    .unwrap();

    assert!(report.failed);
    assert!(report.issues.is_empty());
    assert!(report.msg.contains("Unauthorized"));
}

#[tokio::test(start_paused = true)]
async fn test_verify_machine_config_missing_oc_is_fatal() {
    let fake = FakeProbeExecutor::new().respond(DESCRIBE_NODES, FakeResponse::NotFound);

    let err = verify_machine_config(
        &fake,
        &Oc::default(),
        settings(300, 10),
        settings(300, 3),
        NetworkProvider::OvnKubernetes,
    )
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), 2);
    assert_eq!(fake.total_calls(), 1);
}

#[tokio::test]
async fn test_verify_machine_config_missing_oc_binary_is_fatal() {
    let started = std::time::Instant::now();

    let err = verify_machine_config(
        &RealProbeExecutor::new(),
        &Oc::new("/nonexistent/netmig/oc"),
        settings(300, 10),
        settings(300, 3),
        NetworkProvider::OvnKubernetes,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        PollError::Execution(ExecutionFault::NotFound { ref program })
            if program == "/nonexistent/netmig/oc"
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_machine_config_name_reaches_oc_literally() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("owned");
    let name = format!("x; touch {};", marker.display());

    let result = RealProbeExecutor::new()
        .execute(&Oc::new("echo").get_machine_config(&name))
        .await
        .unwrap();

    assert_eq!(result.status, ProbeStatus::Success);
    assert_eq!(
        result.stdout.trim(),
        format!("get machineconfig {} -o yaml", name)
    );
    assert!(!marker.exists());
}

// ============================================================================
// wait-mco / wait-network-co
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_mco_needs_all_conditions() {
    let oc = Oc::default();
    let pools: Vec<String> = oc
        .wait_machine_config_pools()
        .iter()
        .map(|p| p.to_string())
        .collect();
    let fake = FakeProbeExecutor::new()
        .respond(
            &pools[0],
            FakeResponse::ok(
                "machineconfigpool.machineconfiguration.openshift.io/worker condition met",
            ),
        )
        .respond(
            &pools[1],
            FakeResponse::fail(
                1,
                "error: timed out waiting for the condition on machineconfigpools/worker",
            ),
        )
        .respond(&pools[1], FakeResponse::ok("condition met"))
        .respond(&pools[2], FakeResponse::ok("condition met"));

    let report = wait_for_mco(&fake, &oc, settings(2700, 10)).await.unwrap();

    assert!(!report.failed);
    assert_eq!(report.msg, "MCO finished successfully.");
    assert_eq!(fake.call_count(&pools[0]), 2);
    assert_eq!(fake.call_count(&pools[2]), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_network_co_timeout() {
    let oc = Oc::default();
    let cmd = oc.wait_network_operator_progressing().to_string();
    let fake = FakeProbeExecutor::new().respond(
        &cmd,
        FakeResponse::fail(
            1,
            "error: timed out waiting for the condition on clusteroperators/network",
        ),
    );

    let report = wait_for_network_co(&fake, &oc, settings(30, 10)).await.unwrap();

    assert!(report.failed);
    assert!(report
        .msg
        .starts_with("Timeout waiting for Network Cluster Operator to reach PROGRESSING=True"));
    assert_eq!(fake.call_count(&cmd), 3);
}
