//! Raw rows → nested domain objects.

use crate::backend::Row;
use crate::query::SelectionTree;
use crate::registry::{ColumnType, Registry, RelationInfo, ResolvedModel};
use serde_json::{Map, Value as Json};

pub struct ResultMapper<'a> {
    registry: &'a Registry,
}

impl<'a> ResultMapper<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        ResultMapper { registry }
    }

    /// Map top-level rows, whose columns are labelled `{table}_{column}` and relations by name.
    pub fn map_rows(&self, model: &ResolvedModel, selection: Option<&SelectionTree>, rows: Vec<Row>) -> Vec<Json> {
        if selection.is_none() && model.columns.is_empty() {
            // `table.*` projection: labels are the database's own
            return rows.into_iter().map(Json::Object).collect();
        }
        rows.iter()
            .map(|row| self.map_object(model, selection, row, &|name: &str| model.alias(name)))
            .collect()
    }

    fn map_object(
        &self,
        model: &ResolvedModel,
        selection: Option<&SelectionTree>,
        row: &Row,
        label: &dyn Fn(&str) -> String,
    ) -> Json {
        let mut out = Map::new();
        match selection {
            None => {
                for col in &model.columns {
                    let v = row.get(&label(&col.name)).cloned().unwrap_or(Json::Null);
                    out.insert(col.name.clone(), normalize_scalar(col.ty, v));
                }
            }
            Some(tree) => {
                for (name, sel) in &tree.entries {
                    if let Some(col) = model.column(name) {
                        let v = row.get(&label(name)).cloned().unwrap_or(Json::Null);
                        out.insert(name.clone(), normalize_scalar(col.ty, v));
                    } else if let Some(rel) = model.relation(name) {
                        // unresolved relations were left out of the projection as well
                        let Ok(target) = self.registry.target(model, rel) else {
                            continue;
                        };
                        let v = self.relation_value(target, rel, sel.nested(), row.get(name));
                        out.insert(name.clone(), v);
                    }
                }
            }
        }
        Json::Object(out)
    }

    /// Normalize an aggregated relation cell to the relation's cardinality.
    fn relation_value(
        &self,
        target: &ResolvedModel,
        rel: &RelationInfo,
        nested: Option<&SelectionTree>,
        cell: Option<&Json>,
    ) -> Json {
        let parsed = match cell {
            None | Some(Json::Null) => Json::Null,
            Some(Json::String(s)) => match serde_json::from_str::<Json>(s) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(relation = %rel.name, error = %e, "malformed relation JSON; using empty value");
                    Json::Null
                }
            },
            Some(v) => v.clone(),
        };
        let items: Vec<Json> = match parsed {
            Json::Null => Vec::new(),
            Json::Array(items) => items,
            obj @ Json::Object(_) => vec![obj],
            other => {
                tracing::warn!(relation = %rel.name, value = %other, "unexpected relation value; using empty value");
                Vec::new()
            }
        };
        let mut mapped = items.into_iter().filter_map(|item| match item {
            Json::Object(obj) => Some(self.map_object(target, nested, &obj, &|name: &str| name.to_string())),
            _ => None,
        });
        if rel.kind.is_many() {
            Json::Array(mapped.collect())
        } else {
            mapped.next().unwrap_or(Json::Null)
        }
    }
}

/// Bring a driver value in line with the declared column type (numeric booleans, JSON held as text,
/// numbers held as text).
pub fn normalize_scalar(ty: ColumnType, v: Json) -> Json {
    match (ty, v) {
        (ColumnType::Boolean, Json::Number(n)) => match n.as_i64() {
            Some(0) => Json::Bool(false),
            Some(1) => Json::Bool(true),
            _ => Json::Number(n),
        },
        (ColumnType::Boolean, Json::String(s)) => match s.as_str() {
            "0" | "false" | "FALSE" => Json::Bool(false),
            "1" | "true" | "TRUE" => Json::Bool(true),
            _ => Json::String(s),
        },
        (ColumnType::Json, Json::String(s)) => serde_json::from_str(&s).unwrap_or(Json::String(s)),
        (ColumnType::Number, Json::String(s)) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                Json::from(i)
            } else {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::String(s))
            }
        }
        (_, v) => v,
    }
}
