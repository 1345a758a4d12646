//! Registry validation: identifier shape, disjoint namespaces, local join columns.

use crate::error::RegistryError;
use crate::registry::ModelDefinitions;
use regex::Regex;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_$]*$";

/// PostgreSQL truncates longer identifiers, so a `{table}_{column}` label past this would no longer
/// match the name the mapper reads back.
pub const MAX_LABEL_BYTES: usize = 63;

pub fn validate(defs: &ModelDefinitions) -> Result<(), RegistryError> {
    let ident = Regex::new(IDENTIFIER_PATTERN).map_err(|e| RegistryError::Load(e.to_string()))?;

    for (model_name, model) in defs {
        let names = std::iter::once(model.table.as_str())
            .chain(model.columns.keys().map(String::as_str))
            .chain(model.relations.keys().map(String::as_str))
            .chain(model.sequence.as_deref());
        for name in names {
            if !ident.is_match(name) {
                return Err(RegistryError::InvalidIdentifier {
                    model: model_name.clone(),
                    name: name.to_string(),
                });
            }
        }

        let labels = model
            .columns
            .keys()
            .map(|col| format!("{}_{}", model.table, col))
            .chain(model.relations.keys().cloned());
        for label in labels {
            if label.len() > MAX_LABEL_BYTES {
                return Err(RegistryError::LabelTooLong {
                    model: model_name.clone(),
                    label,
                    max: MAX_LABEL_BYTES,
                });
            }
        }

        for (rel_name, rel) in &model.relations {
            if model.columns.contains_key(rel_name) {
                return Err(RegistryError::OverlappingName {
                    model: model_name.clone(),
                    name: rel_name.clone(),
                });
            }
            if !model.columns.contains_key(&rel.from_column) {
                return Err(RegistryError::UnknownFromColumn {
                    model: model_name.clone(),
                    relation: rel_name.clone(),
                    column: rel.from_column.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::load_from_json_str;

    #[test]
    fn rejects_overlapping_names() {
        let defs = load_from_json_str(
            r#"{
                "user": {
                    "table": "users",
                    "columns": { "id": { "type": "number", "isPrimaryKey": true }, "posts": { "type": "text" } },
                    "relations": { "posts": { "kind": "has_many", "fromColumn": "id", "to": { "model": "post", "column": "user_id" } } }
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(validate(&defs), Err(RegistryError::OverlappingName { .. })));
    }

    #[test]
    fn rejects_quote_in_table_name() {
        let defs = load_from_json_str(r#"{ "user": { "table": "users\"; DROP", "columns": {} } }"#).unwrap();
        assert!(matches!(validate(&defs), Err(RegistryError::InvalidIdentifier { .. })));
    }

    #[test]
    fn rejects_labels_the_database_would_truncate() {
        let defs = load_from_json_str(
            r#"{ "event": { "table": "customer_subscription_billing_events", "columns": {
                "id": { "type": "number", "isPrimaryKey": true },
                "last_successful_payment_time": { "type": "datetime" } } } }"#,
        )
        .unwrap();
        match validate(&defs) {
            Err(RegistryError::LabelTooLong { label, .. }) => {
                assert_eq!(label, "customer_subscription_billing_events_last_successful_payment_time");
                assert_eq!(label.len(), 65);
            }
            other => panic!("expected LabelTooLong, got {:?}", other),
        }

        let defs = load_from_json_str(
            r#"{ "event": { "table": "customer_subscription_billing_events", "columns": {
                "last_successful_payment_at": { "type": "datetime" } } } }"#,
        )
        .unwrap();
        // exactly 63 bytes survives
        assert!(validate(&defs).is_ok());
    }

    #[test]
    fn rejects_undeclared_from_column() {
        let defs = load_from_json_str(
            r#"{
                "user": {
                    "table": "users",
                    "columns": { "id": { "type": "number", "isPrimaryKey": true } },
                    "relations": { "team": { "kind": "belongs_to", "fromColumn": "team_id", "to": { "model": "team", "column": "id" } } }
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(validate(&defs), Err(RegistryError::UnknownFromColumn { .. })));
    }
}
