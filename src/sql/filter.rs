//! Filter compiler: FilterTree → boolean `Expr`, resolved against the registry.

use crate::error::{AppError, CompileError};
use crate::query::{Clause, Condition, Filter, Operator, Operators};
use crate::registry::{ColumnInfo, ColumnType, Registry, RelationInfo, ResolvedModel};
use crate::sql::ast::{AliasGen, CompareOp, Expr};
use crate::sql::dialect::escape_like;
use crate::value::Value;
use serde_json::Value as Json;

pub struct FilterCompiler<'a> {
    registry: &'a Registry,
    aliases: &'a mut AliasGen,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(registry: &'a Registry, aliases: &'a mut AliasGen) -> Self {
        FilterCompiler { registry, aliases }
    }

    /// Compile `filter` for rows of `model` addressed as `qualifier`. An empty filter is `Expr::True`.
    pub fn compile(&mut self, model: &ResolvedModel, filter: &Filter, qualifier: &str) -> Result<Expr, AppError> {
        let mut parts = Vec::with_capacity(filter.clauses.len());
        for clause in &filter.clauses {
            parts.push(self.clause(model, clause, qualifier)?);
        }
        Ok(Expr::and_all(parts))
    }

    fn clause(&mut self, model: &ResolvedModel, clause: &Clause, qualifier: &str) -> Result<Expr, AppError> {
        match clause {
            Clause::And(children) => {
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    parts.push(Expr::group(self.compile(model, child, qualifier)?));
                }
                Ok(match parts.len() {
                    0 => Expr::True,
                    1 => parts.remove(0),
                    _ => Expr::And(parts),
                })
            }
            Clause::Or(children) => {
                if children.is_empty() {
                    return Ok(Expr::False);
                }
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    parts.push(self.compile(model, child, qualifier)?);
                }
                Ok(Expr::group(Expr::Or(parts)))
            }
            Clause::Not(inner) => Ok(Expr::Not(Box::new(self.compile(model, inner, qualifier)?))),
            Clause::Field(name, cond) => {
                if let Some(col) = model.column(name) {
                    return Ok(column_condition(col, cond, qualifier)?);
                }
                if let Some(rel) = model.relation(name) {
                    return self.relation_condition(model, rel, cond, qualifier);
                }
                tracing::debug!(model = %model.name, key = %name, "ignoring unknown filter key");
                Ok(Expr::True)
            }
        }
    }

    /// `EXISTS (SELECT 1 FROM target alias WHERE alias.to = outer.from AND (nested))`.
    fn relation_condition(
        &mut self,
        model: &ResolvedModel,
        rel: &RelationInfo,
        cond: &Condition,
        qualifier: &str,
    ) -> Result<Expr, AppError> {
        let target = self.registry.target(model, rel)?;
        let alias = self.aliases.fresh();
        let join = Expr::compare(
            Expr::column(&alias, &rel.to_column),
            CompareOp::Eq,
            Expr::column(qualifier, &rel.from_column),
        );

        let (inner, negated) = match cond {
            Condition::Nested { filter, .. } => (self.compile(target, filter, &alias)?, false),
            Condition::Operators(ops) if ops.ops.is_empty() => (Expr::True, false),
            Condition::Equals(Json::Bool(true)) => (Expr::True, false),
            Condition::Equals(Json::Bool(false)) | Condition::Equals(Json::Null) => (Expr::True, true),
            _ => {
                tracing::warn!(model = %model.name, relation = %rel.name, "ignoring unsupported relation filter shape");
                return Ok(Expr::True);
            }
        };
        let predicate = match inner {
            Expr::True => join,
            inner => Expr::And(vec![join, Expr::group(inner)]),
        };
        Ok(Expr::Exists {
            table: target.table.clone(),
            alias,
            predicate: Box::new(predicate),
            negated,
        })
    }
}

/// Convenience wrapper: compile an optional filter for a top-level statement on `model`.
pub fn compile_filter(
    registry: &Registry,
    aliases: &mut AliasGen,
    model: &ResolvedModel,
    filter: Option<&Filter>,
) -> Result<Expr, AppError> {
    match filter {
        Some(f) => FilterCompiler::new(registry, aliases).compile(model, f, &model.table),
        None => Ok(Expr::True),
    }
}

fn column_condition(col: &ColumnInfo, cond: &Condition, qualifier: &str) -> Result<Expr, CompileError> {
    let lhs = Expr::column(qualifier, &col.name);
    match cond {
        Condition::Equals(raw) => match Value::from_json(raw, Some(col.ty)) {
            Value::Null => Ok(is_null(lhs, false)),
            Value::Array(items) => Ok(in_list(lhs, items, false)),
            v => Ok(Expr::compare(lhs, CompareOp::Eq, Expr::Literal(v))),
        },
        Condition::Operators(ops) => {
            let mut parts = Vec::with_capacity(ops.ops.len());
            for (op, arg) in &ops.ops {
                parts.push(operator(col, &lhs, *op, arg, ops)?);
            }
            Ok(Expr::and_all(parts))
        }
        Condition::Nested { raw, .. } if col.ty == ColumnType::Json => Ok(Expr::compare(
            lhs,
            CompareOp::Eq,
            Expr::Literal(Value::Json(raw.clone())),
        )),
        Condition::Nested { .. } => {
            tracing::debug!(column = %col.name, "ignoring object condition on non-json column");
            Ok(Expr::True)
        }
    }
}

fn operator(col: &ColumnInfo, lhs: &Expr, op: Operator, arg: &Json, ops: &Operators) -> Result<Expr, CompileError> {
    let unsupported = |reason: &str| CompileError::UnsupportedOperand {
        op: op.as_str().to_string(),
        field: col.name.clone(),
        reason: reason.to_string(),
    };
    let value = Value::from_json(arg, Some(col.ty));

    let comparison = |cmp: CompareOp, value: Value| -> Result<Expr, CompileError> {
        match value {
            Value::Array(_) => Err(unsupported("expects a single value, got an array")),
            Value::Null => Err(unsupported("cannot compare against null")),
            v => Ok(Expr::compare(lhs.clone(), cmp, Expr::Literal(v))),
        }
    };

    match op {
        Operator::Eq if value.is_null() => Ok(is_null(lhs.clone(), false)),
        Operator::Neq if value.is_null() => Ok(is_null(lhs.clone(), true)),
        Operator::Eq => comparison(CompareOp::Eq, value),
        Operator::Neq => comparison(CompareOp::Neq, value),
        Operator::Gt => comparison(CompareOp::Gt, value),
        Operator::Gte => comparison(CompareOp::Gte, value),
        Operator::Lt => comparison(CompareOp::Lt, value),
        Operator::Lte => comparison(CompareOp::Lte, value),
        Operator::Like | Operator::Ilike => {
            let pattern = arg.as_str().ok_or_else(|| unsupported("expects a string pattern"))?;
            Ok(Expr::Like {
                expr: Box::new(lhs.clone()),
                pattern: pattern.to_string(),
                case_insensitive: op == Operator::Ilike,
            })
        }
        Operator::In | Operator::Nin => {
            let items = match value {
                Value::Array(items) => items,
                Value::Null => return Err(unsupported("expects an array")),
                v => vec![v],
            };
            Ok(in_list(lhs.clone(), items, op == Operator::Nin))
        }
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let text = arg.as_str().ok_or_else(|| unsupported("expects a string"))?;
            let escaped = escape_like(text);
            let pattern = match op {
                Operator::Contains => format!("%{}%", escaped),
                Operator::StartsWith => format!("{}%", escaped),
                _ => format!("%{}", escaped),
            };
            Ok(Expr::Like {
                expr: Box::new(lhs.clone()),
                pattern,
                case_insensitive: ops.insensitive,
            })
        }
    }
}

fn is_null(lhs: Expr, negated: bool) -> Expr {
    Expr::IsNull {
        expr: Box::new(lhs),
        negated,
    }
}

/// Membership with SQL three-valued logic made explicit: an empty list is a constant, and a NULL in
/// the list becomes an IS [NOT] NULL test next to the IN list.
fn in_list(lhs: Expr, items: Vec<Value>, negated: bool) -> Expr {
    let has_null = items.iter().any(Value::is_null);
    let list: Vec<Value> = items.into_iter().filter(|v| !v.is_null()).collect();
    let membership = |list: Vec<Value>| Expr::InList {
        expr: Box::new(lhs.clone()),
        list,
        negated,
    };
    match (list.is_empty(), has_null, negated) {
        (true, false, false) => Expr::False,
        (true, false, true) => Expr::True,
        (true, true, _) => is_null(lhs.clone(), negated),
        (false, false, _) => membership(list),
        (false, true, false) => Expr::group(Expr::Or(vec![membership(list), is_null(lhs.clone(), false)])),
        (false, true, true) => Expr::group(Expr::And(vec![membership(list), is_null(lhs.clone(), true)])),
    }
}
