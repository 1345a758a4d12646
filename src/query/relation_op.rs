//! Relation payloads turned into explicit create / update / delete operations before they reach the
//! cascade engine. Item identity comes from the target model's declared primary-key columns.

use crate::error::AppError;
use crate::registry::{Registry, RelationKind, ResolvedModel};
use serde_json::{Map, Value as Json};

pub type Fields = Map<String, Json>;

/// Marker key on a relation item requesting deletion.
pub const DELETE_MARKER: &str = "_delete";

#[derive(Clone, Debug, PartialEq)]
pub enum RelationOp {
    Create(Fields),
    Update { key: Fields, fields: Fields },
    /// `key: None` deletes every related row matching the join key.
    Delete { key: Option<Fields> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationWrite {
    pub relation: String,
    pub ops: Vec<RelationOp>,
}

/// Write data split into the parent's own columns and its relation operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WritePayload {
    pub columns: Fields,
    pub relations: Vec<RelationWrite>,
}

impl RelationOp {
    pub fn from_item(item: &Fields, target: &ResolvedModel) -> RelationOp {
        let delete = matches!(item.get(DELETE_MARKER), Some(Json::Bool(true)));
        let pk_names: Vec<&str> = target.pk_columns().map(|c| c.name.as_str()).collect();
        let key: Option<Fields> = if pk_names.is_empty() {
            None
        } else {
            pk_names
                .iter()
                .map(|pk| match item.get(*pk) {
                    Some(v) if !v.is_null() => Some(((*pk).to_string(), v.clone())),
                    _ => None,
                })
                .collect()
        };

        if delete {
            return RelationOp::Delete { key };
        }
        match key {
            Some(key) => {
                let fields = item
                    .iter()
                    .filter(|(k, _)| k.as_str() != DELETE_MARKER && !key.contains_key(k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                RelationOp::Update { key, fields }
            }
            None => RelationOp::Create(
                item.iter()
                    .filter(|(k, _)| k.as_str() != DELETE_MARKER)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        }
    }
}

impl WritePayload {
    /// Split `data` (and an optional explicit relations map) by the model's declared columns and relations.
    /// Keys that are neither are ignored.
    pub fn split(
        registry: &Registry,
        model: &ResolvedModel,
        data: &Fields,
        relations: Option<&Fields>,
    ) -> Result<WritePayload, AppError> {
        let mut payload = WritePayload::default();
        let entries = data.iter().chain(relations.into_iter().flat_map(|r| r.iter()));
        for (key, value) in entries {
            if model.column(key).is_some() {
                payload.columns.insert(key.clone(), value.clone());
                continue;
            }
            let Some(rel) = model.relation(key) else {
                tracing::debug!(model = %model.name, field = %key, "ignoring undeclared write field");
                continue;
            };
            let target = registry.target(model, rel)?;
            let items = relation_items(key, rel.kind, value)?;
            let ops = items.into_iter().map(|item| RelationOp::from_item(item, target)).collect();
            payload.relations.push(RelationWrite {
                relation: key.clone(),
                ops,
            });
        }
        Ok(payload)
    }
}

fn relation_items<'a>(name: &str, kind: RelationKind, value: &'a Json) -> Result<Vec<&'a Fields>, AppError> {
    let as_object = |v: &'a Json| match v {
        Json::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest(format!("{}: relation items must be objects", name))),
    };
    match (kind, value) {
        (_, Json::Null) => Ok(Vec::new()),
        (_, Json::Array(items)) => items.iter().map(as_object).collect(),
        (_, Json::Object(m)) => Ok(vec![m]),
        (RelationKind::HasMany, _) => Err(AppError::BadRequest(format!("{}: expected an array of objects", name))),
        _ => Err(AppError::BadRequest(format!("{}: expected an object", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{load_from_json_str, resolve};
    use serde_json::json;

    fn registry() -> Registry {
        resolve(
            &load_from_json_str(
                r#"{
                "user": {
                    "table": "users",
                    "columns": { "id": { "type": "number", "isPrimaryKey": true }, "name": { "type": "text" } },
                    "relations": { "posts": { "kind": "has_many", "fromColumn": "id", "to": { "model": "post", "column": "author_id" } } }
                },
                "post": {
                    "table": "posts",
                    "columns": {
                        "post_no": { "type": "number", "isPrimaryKey": true },
                        "author_id": { "type": "number" },
                        "title": { "type": "text" }
                    }
                }
            }"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn splits_columns_and_classifies_items_by_target_key() {
        let registry = registry();
        let user = registry.model_by_name("user").unwrap();
        let data = json!({
            "name": "Ada",
            "unknown": 1,
            "posts": [
                { "title": "new" },
                { "post_no": 7, "title": "renamed" },
                { "post_no": 9, "_delete": true },
                { "_delete": true }
            ]
        });
        let payload = WritePayload::split(&registry, user, data.as_object().unwrap(), None).unwrap();
        assert_eq!(payload.columns, json!({ "name": "Ada" }).as_object().unwrap().clone());
        let ops = &payload.relations[0].ops;
        assert_eq!(ops[0], RelationOp::Create(json!({ "title": "new" }).as_object().unwrap().clone()));
        assert_eq!(
            ops[1],
            RelationOp::Update {
                key: json!({ "post_no": 7 }).as_object().unwrap().clone(),
                fields: json!({ "title": "renamed" }).as_object().unwrap().clone(),
            }
        );
        assert_eq!(
            ops[2],
            RelationOp::Delete {
                key: Some(json!({ "post_no": 9 }).as_object().unwrap().clone())
            }
        );
        assert_eq!(ops[3], RelationOp::Delete { key: None });
    }

    #[test]
    fn an_id_field_is_not_an_identifier_unless_declared_as_key() {
        let registry = registry();
        let post = registry.model_by_name("post").unwrap();
        let op = RelationOp::from_item(json!({ "id": 3, "title": "x" }).as_object().unwrap(), post);
        assert!(matches!(op, RelationOp::Create(_)));
    }
}
