//! Row-store dialect (PostgreSQL syntax).

use crate::error::CompileError;
use crate::registry::ResolvedModel;
use crate::sql::dialect::{array_elements, format_float, hex, quote_text, AggregateField, Dialect, InsertPlan, KeySource};
use crate::sql::Statement;
use crate::value::Value;

/// PostgreSQL functions take at most 100 arguments; each object field uses two.
const MAX_OBJECT_PAIRS: usize = 50;

#[derive(Clone, Copy, Debug, Default)]
pub struct PostgresDialect;

/// `json_build_object(…)`, or for wide targets a `jsonb_build_object(…) || …` concatenation of chunks.
fn build_object(fields: &[AggregateField]) -> String {
    let pairs = |chunk: &[AggregateField]| {
        chunk
            .iter()
            .map(|f| format!("'{}', {}", f.key.replace('\'', "''"), f.expr))
            .collect::<Vec<_>>()
            .join(", ")
    };
    if fields.len() <= MAX_OBJECT_PAIRS {
        return format!("json_build_object({})", pairs(fields));
    }
    let parts = fields
        .chunks(MAX_OBJECT_PAIRS)
        .map(|chunk| format!("jsonb_build_object({})", pairs(chunk)))
        .collect::<Vec<_>>();
    format!("({})", parts.join(" || "))
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn format_literal(&self, value: &Value) -> Result<String, CompileError> {
        Ok(match value {
            Value::Null => "NULL".into(),
            Value::Bool(true) => "TRUE".into(),
            Value::Bool(false) => "FALSE".into(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f)?,
            Value::Text(s) => quote_text(s)?,
            Value::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            Value::DateTime(d) => format!("TIMESTAMP '{}'", d.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Time(t) => format!("TIME '{}'", t.format("%H:%M:%S%.f")),
            Value::Json(j) => quote_text(&j.to_string())?,
            Value::Binary(b) => format!("'\\x{}'::bytea", hex(b)),
            Value::Array(items) => format!("ARRAY[{}]", array_elements(self, items)?.join(", ")),
        })
    }

    fn pagination_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, None) => String::new(),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
        }
    }

    fn aggregate_relation_expr(
        &self,
        fields: &[AggregateField],
        source_table: &str,
        target_table: &str,
        target_alias: &str,
        join_local_col: &str,
        join_remote_col: &str,
    ) -> String {
        let alias = self.quote_identifier(target_alias);
        format!(
            "(SELECT json_agg({}) FROM {} {} WHERE {}.{} = {}.{})",
            build_object(fields),
            self.quote_identifier(target_table),
            alias,
            alias,
            self.quote_identifier(join_remote_col),
            self.quote_identifier(source_table),
            self.quote_identifier(join_local_col),
        )
    }

    fn like_expr(&self, lhs: &str, pattern: &str, case_insensitive: bool) -> String {
        let op = if case_insensitive { "ILIKE" } else { "LIKE" };
        format!("{} {} {} ESCAPE '\\'", lhs, op, pattern)
    }

    fn insert(&self, model: &ResolvedModel, values: &[(String, Value)]) -> Result<InsertPlan, CompileError> {
        let table = self.quote_identifier(&model.table);
        let returning = model
            .columns
            .iter()
            .map(|c| format!("{} AS {}", self.quote_identifier(&c.name), self.quote_identifier(&model.alias(&c.name))))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
        } else {
            let cols: Vec<String> = values.iter().map(|(c, _)| self.quote_identifier(c)).collect();
            let vals = values
                .iter()
                .map(|(_, v)| self.format_literal(v))
                .collect::<Result<Vec<_>, _>>()?;
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                table,
                cols.join(", "),
                vals.join(", "),
                returning
            )
        };
        Ok(InsertPlan {
            statement: Statement::new(sql),
            keys: KeySource::Returning,
        })
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn begin_transaction(&self) -> Option<&'static str> {
        Some("BEGIN")
    }
}
