//! Per-entity issue collection for multi-entity checks.

use serde::{Deserialize, Serialize};
use std::future::Future;

/// One problem found on one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIssue {
    pub entity_id: String,
    pub description: String,
}

impl EntityIssue {
    pub fn new(entity_id: &str, description: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            description: description.into(),
        }
    }
}

/// Run `check` for every entity in order and collect all issues.
///
/// Failing entities never stop the loop, so the report is complete. Only a
/// fatal error from `check` aborts. Each check runs its own polls; nothing
/// is shared between entities except the issue list.
pub async fn aggregate<T, E, F, Fut>(entities: &[T], mut check: F) -> Result<Vec<EntityIssue>, E>
where
    F: FnMut(&T) -> Fut,
    Fut: Future<Output = Result<Vec<EntityIssue>, E>>,
{
    let mut issues = Vec::new();
    for entity in entities {
        issues.extend(check(entity).await?);
    }
    Ok(issues)
}
