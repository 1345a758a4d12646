//! Statement assembly: SELECT / UPDATE / DELETE text from compiled parts. INSERT is dialect-specific
//! (see `Dialect::insert`).

use crate::error::CompileError;
use crate::registry::{ColumnType, ResolvedModel};
use crate::sql::ast::{CompareOp, Expr, Select};
use crate::sql::dialect::Dialect;
use crate::sql::render::Renderer;
use crate::value::Value;

/// One SQL statement ready for the backend. Compiled statements inline their literals and carry no
/// params; raw statements carry positional params.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    /// Named bind variables the backend must allocate (enterprise key acquisition).
    pub binds: Vec<Bind>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bind {
    pub name: String,
    pub column: String,
    pub ty: ColumnType,
    pub mode: BindMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindMode {
    Out,
    InOut,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
            binds: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Statement {
            sql: sql.into(),
            params,
            binds: Vec::new(),
        }
    }
}

pub fn select(dialect: &dyn Dialect, select: &Select) -> Result<Statement, CompileError> {
    Ok(Statement::new(Renderer::new(dialect).select(select)?))
}

/// UPDATE model SET col = literal, … WHERE filter. `filter` is qualified with the table name.
pub fn update(
    dialect: &dyn Dialect,
    model: &ResolvedModel,
    sets: &[(String, Value)],
    filter: &Expr,
) -> Result<Statement, CompileError> {
    let r = Renderer::new(dialect);
    let set_clause = sets
        .iter()
        .map(|(col, v)| Ok(format!("{} = {}", dialect.quote_identifier(col), r.literal(v)?)))
        .collect::<Result<Vec<_>, CompileError>>()?
        .join(", ");
    Ok(Statement::new(format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.quote_identifier(&model.table),
        set_clause,
        r.expr(filter)?
    )))
}

pub fn delete(dialect: &dyn Dialect, model: &ResolvedModel, filter: &Expr) -> Result<Statement, CompileError> {
    let r = Renderer::new(dialect);
    Ok(Statement::new(format!(
        "DELETE FROM {} WHERE {}",
        dialect.quote_identifier(&model.table),
        r.expr(filter)?
    )))
}

/// `qualifier.col = value AND …` over the given (column, value) pairs.
pub fn equals_all(qualifier: &str, pairs: &[(String, Value)]) -> Expr {
    Expr::and_all(
        pairs
            .iter()
            .map(|(col, v)| match v {
                Value::Null => Expr::IsNull {
                    expr: Box::new(Expr::column(qualifier, col)),
                    negated: false,
                },
                v => Expr::compare(Expr::column(qualifier, col), CompareOp::Eq, Expr::Literal(v.clone())),
            })
            .collect(),
    )
}
