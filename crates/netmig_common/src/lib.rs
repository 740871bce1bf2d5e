//! netmig common - polling engine and shared types for network-provider
//! migration checks.
//!
//! Every check is a probe (an `oc` invocation), a condition over its
//! output, and a time budget. `PollDriver` ties them together.

pub mod aggregate;
pub mod condition;
pub mod config;
pub mod error;
pub mod executor;
pub mod poll;
pub mod probe;
pub mod provider;
pub mod records;
pub mod report;

pub use aggregate::{aggregate, EntityIssue};
pub use condition::{evaluate, ConditionSpec, Evaluation, Extracted};
pub use config::{Config, PollConfig};
pub use error::{ExecutionFault, PollError};
pub use executor::{FakeProbeExecutor, FakeResponse, ProbeExecutor, RealProbeExecutor};
pub use poll::{PollDriver, PollOutcome, PollSettings};
pub use probe::{classify, Classified, ProbeRequest, ProbeResult, ProbeStatus};
pub use provider::NetworkProvider;
pub use records::{parse_records, NodeRecord};
pub use report::StepReport;
