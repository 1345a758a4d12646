//! Projection compiler: SelectionTree → select items, with relations as JSON aggregates.

use crate::query::{Selection, SelectionTree};
use crate::registry::{Registry, RelationInfo, ResolvedModel};
use crate::sql::ast::{AliasGen, ColumnRef, JsonField, JsonFieldValue, RelationAggregate, SelectExpr, SelectItem};
use crate::value::Value;

/// Alias of the placeholder item emitted when a selection names nothing selectable.
pub const EMPTY_SELECTION_ALIAS: &str = "_";

pub struct ProjectionCompiler<'a> {
    registry: &'a Registry,
    aliases: &'a mut AliasGen,
}

impl<'a> ProjectionCompiler<'a> {
    pub fn new(registry: &'a Registry, aliases: &'a mut AliasGen) -> Self {
        ProjectionCompiler { registry, aliases }
    }

    /// Top-level select list. Columns are aliased `{table}_{column}`; relations keep their field name.
    pub fn compile(&mut self, model: &ResolvedModel, selection: Option<&SelectionTree>) -> Vec<SelectItem> {
        let qualifier = model.table.as_str();
        let Some(tree) = selection else {
            if model.columns.is_empty() {
                return vec![SelectItem {
                    expr: SelectExpr::AllColumns(qualifier.to_string()),
                    alias: None,
                }];
            }
            return model.columns.iter().map(|c| column_item(model, qualifier, &c.name)).collect();
        };

        let mut items = Vec::with_capacity(tree.entries.len());
        for (name, sel) in &tree.entries {
            if model.column(name).is_some() {
                items.push(column_item(model, qualifier, name));
            } else if let Some(rel) = model.relation(name) {
                if let Some(agg) = self.aggregate(model, rel, sel.nested(), qualifier) {
                    items.push(SelectItem {
                        expr: SelectExpr::Relation(agg),
                        alias: Some(rel.name.clone()),
                    });
                }
            } else {
                tracing::warn!(model = %model.name, field = %name, "skipping unknown selection entry");
            }
        }
        if items.is_empty() {
            items.push(SelectItem {
                expr: SelectExpr::Literal(Value::Int(1)),
                alias: Some(EMPTY_SELECTION_ALIAS.to_string()),
            });
        }
        items
    }

    fn aggregate(
        &mut self,
        owner: &ResolvedModel,
        rel: &RelationInfo,
        nested: Option<&SelectionTree>,
        source_qualifier: &str,
    ) -> Option<RelationAggregate> {
        let target = match self.registry.target(owner, rel) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unresolved relation in selection");
                return None;
            }
        };
        let alias = self.aliases.fresh();
        let fields = self.json_fields(target, nested, &alias);
        Some(RelationAggregate {
            fields,
            source_qualifier: source_qualifier.to_string(),
            target_table: target.table.clone(),
            target_alias: alias,
            local_col: rel.from_column.clone(),
            remote_col: rel.to_column.clone(),
        })
    }

    fn json_fields(&mut self, target: &ResolvedModel, nested: Option<&SelectionTree>, alias: &str) -> Vec<JsonField> {
        let Some(tree) = nested else {
            return target
                .columns
                .iter()
                .map(|c| JsonField {
                    key: c.name.clone(),
                    value: JsonFieldValue::Column(ColumnRef::new(alias, &c.name)),
                })
                .collect();
        };
        let mut fields = Vec::new();
        for (name, sel) in &tree.entries {
            if target.column(name).is_some() {
                fields.push(JsonField {
                    key: name.clone(),
                    value: JsonFieldValue::Column(ColumnRef::new(alias, name)),
                });
            } else if let Some(rel) = target.relation(name) {
                let inner = match sel {
                    Selection::All => None,
                    Selection::Nested(t) => Some(t),
                };
                if let Some(agg) = self.aggregate(target, rel, inner, alias) {
                    fields.push(JsonField {
                        key: name.clone(),
                        value: JsonFieldValue::Relation(Box::new(agg)),
                    });
                }
            } else {
                tracing::warn!(model = %target.name, field = %name, "skipping unknown selection entry");
            }
        }
        fields
    }
}

fn column_item(model: &ResolvedModel, qualifier: &str, column: &str) -> SelectItem {
    SelectItem {
        expr: SelectExpr::Column(ColumnRef::new(qualifier, column)),
        alias: Some(model.alias(column)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{load_from_json_str, resolve};
    use crate::sql::render::Renderer;
    use crate::sql::{OracleDialect, PostgresDialect};
    use serde_json::json;

    fn registry() -> Registry {
        resolve(
            &load_from_json_str(
                r#"{
                "user": {
                    "table": "users",
                    "columns": {
                        "id": { "type": "number", "isPrimaryKey": true },
                        "name": { "type": "text" }
                    },
                    "relations": {
                        "posts": { "kind": "has_many", "fromColumn": "id", "to": { "model": "post", "column": "author_id" } },
                        "ghost": { "kind": "has_one", "fromColumn": "id", "to": { "model": "missing", "column": "user_id" } }
                    }
                },
                "post": {
                    "table": "posts",
                    "columns": {
                        "id": { "type": "number", "isPrimaryKey": true },
                        "author_id": { "type": "number" },
                        "title": { "type": "text" }
                    },
                    "relations": {
                        "author": { "kind": "belongs_to", "fromColumn": "author_id", "to": { "model": "user", "column": "id" } }
                    }
                }
            }"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn render(dialect: &dyn crate::sql::Dialect, select: Option<serde_json::Value>) -> String {
        let registry = registry();
        let user = registry.model_by_name("user").unwrap();
        let tree = select.map(|s| SelectionTree::from_json(&s).unwrap());
        let mut aliases = AliasGen::default();
        let items = ProjectionCompiler::new(&registry, &mut aliases).compile(user, tree.as_ref());
        Renderer::new(dialect).select_items(&items).unwrap()
    }

    #[test]
    fn default_selection_lists_every_column_aliased() {
        assert_eq!(
            render(&PostgresDialect, None),
            "\"users\".\"id\" AS \"users_id\", \"users\".\"name\" AS \"users_name\""
        );
    }

    #[test]
    fn relation_becomes_json_aggregate() {
        assert_eq!(
            render(&PostgresDialect, Some(json!({ "name": true, "posts": { "select": { "title": true } } }))),
            "\"users\".\"name\" AS \"users_name\", (SELECT json_agg(json_build_object('title', \"t1\".\"title\")) \
             FROM \"posts\" \"t1\" WHERE \"t1\".\"author_id\" = \"users\".\"id\") AS \"posts\""
        );
    }

    #[test]
    fn nested_relations_nest_aggregates_with_fresh_aliases() {
        let sql = render(&OracleDialect, Some(json!({ "posts": { "title": true, "author": { "name": true } } })));
        assert_eq!(
            sql,
            "(SELECT JSON_ARRAYAGG(JSON_OBJECT('title' VALUE \"t1\".\"title\", 'author' VALUE \
             (SELECT JSON_ARRAYAGG(JSON_OBJECT('name' VALUE \"t2\".\"name\" RETURNING CLOB) RETURNING CLOB) \
             FROM \"users\" \"t2\" WHERE \"t2\".\"id\" = \"t1\".\"author_id\") FORMAT JSON RETURNING CLOB) RETURNING CLOB) \
             FROM \"posts\" \"t1\" WHERE \"t1\".\"author_id\" = \"users\".\"id\") AS \"posts\""
        );
    }

    #[test]
    fn unknown_and_unresolved_entries_are_skipped() {
        assert_eq!(
            render(&PostgresDialect, Some(json!({ "ghost": true, "nope": true, "id": true }))),
            "\"users\".\"id\" AS \"users_id\""
        );
        assert_eq!(render(&PostgresDialect, Some(json!({ "ghost": true }))), "1 AS \"_\"");
    }

    #[test]
    fn false_entries_are_not_selected() {
        assert_eq!(
            render(&PostgresDialect, Some(json!({ "id": true, "name": false }))),
            "\"users\".\"id\" AS \"users_id\""
        );
    }
}
