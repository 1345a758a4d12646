//! Load model definitions from JSON and resolve them into a `Registry`.

use crate::error::RegistryError;
use crate::registry::resolved::{ColumnInfo, ModelId, Registry, RelationInfo, ResolvedModel};
use crate::registry::{validate, ModelDefinitions};
use std::collections::HashMap;
use std::path::Path;

/// Build the resolved registry from raw definitions (validates first).
pub fn resolve(defs: &ModelDefinitions) -> Result<Registry, RegistryError> {
    validate(defs)?;

    let ids: HashMap<&str, ModelId> = defs
        .keys()
        .enumerate()
        .map(|(i, name)| (name.as_str(), ModelId(i)))
        .collect();

    let mut models = Vec::with_capacity(defs.len());
    for (i, (name, def)) in defs.iter().enumerate() {
        let columns = def
            .columns
            .iter()
            .map(|(col_name, col)| ColumnInfo {
                name: col_name.clone(),
                ty: col.type_,
                primary_key: col.is_primary_key,
            })
            .collect();

        let relations = def
            .relations
            .iter()
            .map(|(rel_name, rel)| {
                let target = ids.get(rel.to.model.as_str()).copied().filter(|id| {
                    defs[id.0].columns.contains_key(&rel.to.column)
                });
                if target.is_none() {
                    tracing::warn!(
                        model = %name,
                        relation = %rel_name,
                        target = %rel.to.model,
                        "relation target not resolvable; it will be skipped"
                    );
                }
                RelationInfo {
                    name: rel_name.clone(),
                    kind: rel.kind,
                    from_column: rel.from_column.clone(),
                    target_model: rel.to.model.clone(),
                    to_column: rel.to.column.clone(),
                    target,
                }
            })
            .collect();

        models.push(ResolvedModel {
            id: ModelId(i),
            name: name.clone(),
            table: def.table.clone(),
            columns,
            relations,
            sequence: def
                .sequence
                .clone()
                .unwrap_or_else(|| format!("{}_seq", def.table)),
        });
    }

    Ok(Registry::from_models(models))
}

pub fn load_from_json_str(json: &str) -> Result<ModelDefinitions, RegistryError> {
    serde_json::from_str(json).map_err(|e| RegistryError::Load(e.to_string()))
}

/// Read a generated `models.json` (model name → definition).
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ModelDefinitions, RegistryError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RegistryError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ColumnType, RelationKind};

    const MODELS: &str = r#"{
        "user": {
            "table": "users",
            "columns": {
                "id": { "type": "number", "isPrimaryKey": true },
                "name": { "type": "text" }
            },
            "relations": {
                "posts": { "kind": "has_many", "fromColumn": "id", "to": { "model": "post", "column": "author_id" } },
                "avatar": { "kind": "has_one", "fromColumn": "id", "to": { "model": "image", "column": "user_id" } }
            }
        },
        "post": {
            "table": "posts",
            "columns": {
                "id": { "type": "number", "isPrimaryKey": true },
                "author_id": { "type": "number" }
            }
        }
    }"#;

    #[test]
    fn resolves_models_and_relations() {
        let registry = resolve(&load_from_json_str(MODELS).unwrap()).unwrap();
        let user = registry.model_by_name("user").unwrap();
        assert_eq!(user.table, "users");
        assert_eq!(user.sequence, "users_seq");
        assert_eq!(user.column("name").unwrap().ty, ColumnType::Text);
        let posts = user.relation("posts").unwrap();
        assert_eq!(posts.kind, RelationKind::HasMany);
        assert_eq!(registry.target(user, posts).unwrap().table, "posts");
    }

    #[test]
    fn unresolved_target_is_kept_but_flagged() {
        let registry = resolve(&load_from_json_str(MODELS).unwrap()).unwrap();
        let user = registry.model_by_name("user").unwrap();
        let avatar = user.relation("avatar").unwrap();
        assert!(avatar.target.is_none());
        assert!(matches!(
            registry.target(user, avatar),
            Err(RegistryError::MissingRelationTarget { .. })
        ));
    }

    #[test]
    fn missing_model_is_an_error() {
        let registry = resolve(&load_from_json_str(MODELS).unwrap()).unwrap();
        assert!(matches!(registry.model_by_name("nope"), Err(RegistryError::MissingModel(_))));
    }
}
