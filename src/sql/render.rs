//! Walks the AST and produces SQL text; the only place values turn into literals.

use crate::error::CompileError;
use crate::query::Direction;
use crate::sql::ast::*;
use crate::sql::dialect::{AggregateField, Dialect};
use crate::value::Value;

pub struct Renderer<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Renderer { dialect }
    }

    pub fn column(&self, c: &ColumnRef) -> String {
        format!(
            "{}.{}",
            self.dialect.quote_identifier(&c.qualifier),
            self.dialect.quote_identifier(&c.name)
        )
    }

    pub fn literal(&self, v: &Value) -> Result<String, CompileError> {
        self.dialect.format_literal(v)
    }

    pub fn expr(&self, e: &Expr) -> Result<String, CompileError> {
        Ok(match e {
            Expr::True => "1=1".into(),
            Expr::False => "1=0".into(),
            Expr::Column(c) => self.column(c),
            Expr::Literal(v) => self.literal(v)?,
            Expr::Compare { lhs, op, rhs } => {
                format!("{} {} {}", self.expr(lhs)?, op.as_sql(), self.expr(rhs)?)
            }
            Expr::IsNull { expr, negated } => {
                let not = if *negated { " NOT" } else { "" };
                format!("{} IS{} NULL", self.expr(expr)?, not)
            }
            Expr::InList { expr, list, negated } => {
                let items = list
                    .iter()
                    .map(|v| match v {
                        Value::Array(_) => Err(CompileError::UnsupportedLiteralType("nested array".into())),
                        v => self.literal(v),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let not = if *negated { " NOT" } else { "" };
                format!("{}{} IN ({})", self.expr(expr)?, not, items.join(", "))
            }
            Expr::Like {
                expr,
                pattern,
                case_insensitive,
            } => {
                let pattern = self.literal(&Value::Text(pattern.clone()))?;
                self.dialect.like_expr(&self.expr(expr)?, &pattern, *case_insensitive)
            }
            Expr::And(parts) => self.join(parts, " AND ", "1=1")?,
            Expr::Or(parts) => self.join(parts, " OR ", "1=0")?,
            Expr::Group(inner) => format!("({})", self.expr(inner)?),
            Expr::Not(inner) => format!("NOT ({})", self.expr(inner)?),
            Expr::Exists {
                table,
                alias,
                predicate,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{}EXISTS (SELECT 1 FROM {} {} WHERE {})",
                    not,
                    self.dialect.quote_identifier(table),
                    self.dialect.quote_identifier(alias),
                    self.expr(predicate)?
                )
            }
        })
    }

    fn join(&self, parts: &[Expr], sep: &str, empty: &str) -> Result<String, CompileError> {
        if parts.is_empty() {
            return Ok(empty.to_string());
        }
        Ok(parts
            .iter()
            .map(|p| self.expr(p))
            .collect::<Result<Vec<_>, _>>()?
            .join(sep))
    }

    pub fn aggregate(&self, agg: &RelationAggregate) -> Result<String, CompileError> {
        let fields = agg
            .fields
            .iter()
            .map(|f| {
                Ok(match &f.value {
                    JsonFieldValue::Column(c) => AggregateField {
                        key: f.key.clone(),
                        expr: self.column(c),
                        json: false,
                    },
                    JsonFieldValue::Relation(nested) => AggregateField {
                        key: f.key.clone(),
                        expr: self.aggregate(nested)?,
                        json: true,
                    },
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;
        Ok(self.dialect.aggregate_relation_expr(
            &fields,
            &agg.source_qualifier,
            &agg.target_table,
            &agg.target_alias,
            &agg.local_col,
            &agg.remote_col,
        ))
    }

    pub fn select_items(&self, items: &[SelectItem]) -> Result<String, CompileError> {
        let parts = items
            .iter()
            .map(|item| {
                let expr = match &item.expr {
                    SelectExpr::Column(c) => self.column(c),
                    SelectExpr::AllColumns(q) => format!("{}.*", self.dialect.quote_identifier(q)),
                    SelectExpr::Relation(agg) => self.aggregate(agg)?,
                    SelectExpr::Literal(v) => self.literal(v)?,
                };
                Ok(match &item.alias {
                    Some(alias) => format!("{} AS {}", expr, self.dialect.quote_identifier(alias)),
                    None => expr,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;
        Ok(parts.join(", "))
    }

    pub fn select(&self, s: &Select) -> Result<String, CompileError> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_items(&s.items)?,
            self.dialect.quote_identifier(&s.table)
        );
        if s.filter != Expr::True {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(&s.filter)?);
        }
        if !s.order.is_empty() {
            let order = s
                .order
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", self.column(&o.column), dir)
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        let page = self.dialect.pagination_clause(s.limit, s.offset);
        if !page.is_empty() {
            sql.push(' ');
            sql.push_str(&page);
        }
        Ok(sql)
    }
}
