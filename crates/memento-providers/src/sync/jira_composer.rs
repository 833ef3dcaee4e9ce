//! Composer for a Jira-shaped ticket tracker (§4.4.3 supplement). Only the
//! composition and incremental-state handling are specified for this family;
//! no `UpstreamSource` implementation exists for it yet, so it is exercised
//! directly against `RawEntity` values rather than wired into a sync engine.

use async_trait::async_trait;
use memento_domain::entities::EntityKind;
use memento_domain::error::Result;
use memento_domain::ports::{ComposedEntity, Composer, RawEntity};
use serde_json::Value;

/// Composes Jira-shaped tickets (`key`, `fields.summary`, `fields.description`,
/// `fields.status.name`, `fields.labels`) into the same `Issues` kind a
/// GitHub-shaped tracker would produce, so downstream classification and
/// storage are source-agnostic.
#[derive(Debug, Default)]
pub struct JiraIssueComposer;

#[async_trait]
impl Composer for JiraIssueComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::Issues
    }

    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let raw = &entity.raw;
        let key = raw.get("key").and_then(Value::as_str).unwrap_or("");
        let fields = raw.get("fields").cloned().unwrap_or_default();
        let summary = fields.get("summary").and_then(Value::as_str).unwrap_or("");
        let description = fields.get("description").and_then(Value::as_str).unwrap_or("");
        let status = fields
            .get("status")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let labels = fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let text = format!("Ticket {key}: {summary}\nStatus: {status}\nLabels: {labels}\n\n{description}");
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text,
            source_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn composes_summary_and_status() {
        let entity = RawEntity {
            external_id: "PROJ-42".to_owned(),
            kind: EntityKind::Issues,
            raw: json!({
                "key": "PROJ-42",
                "fields": {
                    "summary": "Login fails on retry",
                    "description": "Second attempt 500s.",
                    "status": {"name": "In Progress"},
                    "labels": ["auth", "regression"],
                },
            }),
        };
        let composed = JiraIssueComposer.compose(&entity).await.expect("compose");
        assert!(composed.text.contains("Ticket PROJ-42: Login fails on retry"));
        assert!(composed.text.contains("auth, regression"));
        assert_eq!(composed.kind, EntityKind::Issues);
    }
}
