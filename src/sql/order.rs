//! ORDER BY compilation: fields map to table-qualified columns, unknown fields are dropped.

use crate::query::OrderSpec;
use crate::registry::ResolvedModel;
use crate::sql::ast::{ColumnRef, OrderItem};

pub fn compile_order(model: &ResolvedModel, spec: Option<&OrderSpec>) -> Vec<OrderItem> {
    let Some(spec) = spec else {
        return Vec::new();
    };
    spec.0
        .iter()
        .filter_map(|(field, direction)| {
            if model.column(field).is_none() {
                tracing::warn!(model = %model.name, field = %field, "skipping unknown order field");
                return None;
            }
            Some(OrderItem {
                column: ColumnRef::new(&model.table, field),
                direction: *direction,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;
    use crate::registry::{load_from_json_str, resolve};

    #[test]
    fn unknown_fields_are_skipped() {
        let registry = resolve(
            &load_from_json_str(
                r#"{ "user": { "table": "users", "columns": {
                    "id": { "type": "number", "isPrimaryKey": true },
                    "name": { "type": "text" } } } }"#,
            )
            .unwrap(),
        )
        .unwrap();
        let user = registry.model_by_name("user").unwrap();
        let spec = OrderSpec(vec![
            ("name".into(), Direction::Desc),
            ("shoe".into(), Direction::Asc),
            ("id".into(), Direction::Asc),
        ]);
        let items = compile_order(user, Some(&spec));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].column, ColumnRef::new("users", "name"));
        assert_eq!(items[0].direction, Direction::Desc);
        assert_eq!(items[1].column.name, "id");
    }
}
