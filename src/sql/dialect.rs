//! The seam between the shared compilers and backend-specific SQL syntax.

use crate::error::CompileError;
use crate::registry::ResolvedModel;
use crate::sql::Statement;
use crate::value::Value;
use std::fmt::Debug;

/// One `key: expression` entry of a JSON object built inside a relation aggregate.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateField {
    pub key: String,
    /// Already-rendered SQL expression.
    pub expr: String,
    /// True when `expr` itself yields JSON (a nested relation aggregate).
    pub json: bool,
}

/// INSERT statement plus where the new row's key values come from.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertPlan {
    pub statement: Statement,
    pub keys: KeySource,
}

#[derive(Clone, Debug, PartialEq)]
pub enum KeySource {
    /// The statement returns the inserted row with aliased columns.
    Returning,
    /// Key values arrive in OUT binds: (bind name, key column).
    OutBinds(Vec<(String, String)>),
}

pub trait Dialect: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn format_literal(&self, value: &Value) -> Result<String, CompileError>;

    /// Empty when neither bound is given.
    fn pagination_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Correlated scalar subquery yielding a JSON array of objects, or NULL when nothing matches.
    fn aggregate_relation_expr(
        &self,
        fields: &[AggregateField],
        source_table: &str,
        target_table: &str,
        target_alias: &str,
        join_local_col: &str,
        join_remote_col: &str,
    ) -> String;

    /// `lhs LIKE pattern` with backslash as the escape character.
    fn like_expr(&self, lhs: &str, pattern: &str, case_insensitive: bool) -> String;

    /// INSERT of `values` into `model`, acquiring every primary-key value of the new row.
    fn insert(&self, model: &ResolvedModel, values: &[(String, Value)]) -> Result<InsertPlan, CompileError>;

    /// Positional placeholder for raw statements (1-based).
    fn placeholder(&self, index: usize) -> String;

    /// Statement that opens a transaction; None when the backend opens one implicitly.
    fn begin_transaction(&self) -> Option<&'static str>;
}

/// Single-quoted SQL string with embedded quotes doubled. Rejects NUL, which neither backend accepts in text.
pub(crate) fn quote_text(s: &str) -> Result<String, CompileError> {
    if s.contains('\0') {
        return Err(CompileError::UnsupportedLiteralType("text containing NUL".into()));
    }
    Ok(format!("'{}'", s.replace('\'', "''")))
}

pub(crate) fn format_float(f: f64) -> Result<String, CompileError> {
    if !f.is_finite() {
        return Err(CompileError::UnsupportedLiteralType(format!("non-finite number {}", f)));
    }
    Ok(f.to_string())
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Escape `\`, `%` and `_` so caller text matches literally inside a LIKE pattern.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Elements of an array literal; nested arrays have no literal form on either backend.
pub(crate) fn array_elements(dialect: &dyn Dialect, items: &[Value]) -> Result<Vec<String>, CompileError> {
    if items.is_empty() {
        return Err(CompileError::UnsupportedLiteralType("empty array".into()));
    }
    items
        .iter()
        .map(|v| match v {
            Value::Array(_) => Err(CompileError::UnsupportedLiteralType("nested array".into())),
            v => dialect.format_literal(v),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like(r"50%_off\now"), r"50\%\_off\\now");
    }

    #[test]
    fn text_quotes_are_doubled() {
        assert_eq!(quote_text("O'Brien's").unwrap(), "'O''Brien''s'");
        assert!(quote_text("a\0b").is_err());
    }
}
