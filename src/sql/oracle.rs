//! Enterprise dialect (Oracle syntax): numeric booleans, OFFSET/FETCH pagination, JSON_ARRAYAGG,
//! and sequence-allocated keys returned through bind variables.

use crate::error::CompileError;
use crate::registry::ResolvedModel;
use crate::sql::dialect::{array_elements, format_float, hex, quote_text, AggregateField, Dialect, InsertPlan, KeySource};
use crate::sql::{Bind, BindMode, Statement};
use crate::value::Value;

#[derive(Clone, Copy, Debug, Default)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn format_literal(&self, value: &Value) -> Result<String, CompileError> {
        Ok(match value {
            Value::Null => "NULL".into(),
            Value::Bool(true) => "1".into(),
            Value::Bool(false) => "0".into(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f)?,
            Value::Text(s) => quote_text(s)?,
            Value::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            Value::DateTime(d) => format!("TIMESTAMP '{}'", d.format("%Y-%m-%d %H:%M:%S%.f")),
            // no TIME type; times are stored as text
            Value::Time(t) => quote_text(&t.format("%H:%M:%S").to_string())?,
            Value::Json(j) => quote_text(&j.to_string())?,
            Value::Binary(b) => format!("HEXTORAW('{}')", hex(b)),
            Value::Array(items) => format!("({})", array_elements(self, items)?.join(", ")),
        })
    }

    fn pagination_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, None) => String::new(),
            (Some(l), None) => format!("FETCH FIRST {} ROWS ONLY", l),
            (None, Some(o)) => format!("OFFSET {} ROWS", o),
            (Some(l), Some(o)) => format!("OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", o, l),
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
        let object = fields
            .iter()
            .map(|f| {
                let format = if f.json { " FORMAT JSON" } else { "" };
                format!("'{}' VALUE {}{}", f.key.replace('\'', "''"), f.expr, format)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let alias = self.quote_identifier(target_alias);
        format!(
            "(SELECT JSON_ARRAYAGG(JSON_OBJECT({} RETURNING CLOB) RETURNING CLOB) FROM {} {} WHERE {}.{} = {}.{})",
            object,
            self.quote_identifier(target_table),
            alias,
            alias,
            self.quote_identifier(join_remote_col),
            self.quote_identifier(source_table),
            self.quote_identifier(join_local_col),
        )
    }

    fn like_expr(&self, lhs: &str, pattern: &str, case_insensitive: bool) -> String {
        if case_insensitive {
            format!("UPPER({}) LIKE UPPER({}) ESCAPE '\\'", lhs, pattern)
        } else {
            format!("{} LIKE {} ESCAPE '\\'", lhs, pattern)
        }
    }

    /// Anonymous block: each missing key column takes `NEXTVAL` into an IN OUT bind that the INSERT then
    /// uses, and `RETURNING … INTO` reports every key column through OUT binds.
    fn insert(&self, model: &ResolvedModel, values: &[(String, Value)]) -> Result<InsertPlan, CompileError> {
        let table = self.quote_identifier(&model.table);
        let sequence = self.quote_identifier(&model.sequence);
        let mut binds = Vec::new();
        let mut cols: Vec<String> = values.iter().map(|(c, _)| self.quote_identifier(c)).collect();
        let mut vals = values
            .iter()
            .map(|(_, v)| self.format_literal(v))
            .collect::<Result<Vec<_>, _>>()?;

        let mut block = String::from("BEGIN ");
        let missing = model
            .pk_columns()
            .filter(|pk| !values.iter().any(|(c, _)| *c == pk.name));
        for (i, pk) in missing.enumerate() {
            let name = format!("seq_{}", i);
            block.push_str(&format!("SELECT {}.NEXTVAL INTO :{} FROM DUAL; ", sequence, name));
            cols.push(self.quote_identifier(&pk.name));
            vals.push(format!(":{}", name));
            binds.push(Bind {
                name,
                column: pk.name.clone(),
                ty: pk.ty,
                mode: BindMode::InOut,
            });
        }

        let mut returning_cols = Vec::new();
        let mut returning_binds = Vec::new();
        let mut keys = Vec::new();
        for (i, pk) in model.pk_columns().enumerate() {
            let name = format!("ret_{}", i);
            returning_cols.push(self.quote_identifier(&pk.name));
            returning_binds.push(format!(":{}", name));
            keys.push((name.clone(), pk.name.clone()));
            binds.push(Bind {
                name,
                column: pk.name.clone(),
                ty: pk.ty,
                mode: BindMode::Out,
            });
        }

        block.push_str(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            vals.join(", ")
        ));
        if !returning_cols.is_empty() {
            block.push_str(&format!(
                " RETURNING {} INTO {}",
                returning_cols.join(", "),
                returning_binds.join(", ")
            ));
        }
        block.push_str("; END;");

        Ok(InsertPlan {
            statement: Statement {
                sql: block,
                params: Vec::new(),
                binds,
            },
            keys: KeySource::OutBinds(keys),
        })
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":{}", index)
    }

    fn begin_transaction(&self) -> Option<&'static str> {
        None
    }
}
