//! Small SQL AST produced by the compilers and walked by `Renderer`.

use crate::query::Direction;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Tautology, rendered `1=1`.
    True,
    /// Contradiction, rendered `1=0`.
    False,
    Column(ColumnRef),
    Literal(Value),
    Compare {
        lhs: Box<Expr>,
        op: CompareOp,
        rhs: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    /// Non-empty list; empty lists are folded into `True`/`False` by the filter compiler.
    InList {
        expr: Box<Expr>,
        list: Vec<Value>,
        negated: bool,
    },
    Like {
        expr: Box<Expr>,
        pattern: String,
        case_insensitive: bool,
    },
    /// Sibling conditions joined with AND, no surrounding parentheses.
    And(Vec<Expr>),
    /// Alternatives joined with OR, no surrounding parentheses.
    Or(Vec<Expr>),
    Group(Box<Expr>),
    Not(Box<Expr>),
    Exists {
        table: String,
        alias: String,
        predicate: Box<Expr>,
        negated: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: String,
    pub name: String,
}

impl ColumnRef {
    pub fn new(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnRef {
            qualifier: qualifier.into(),
            name: name.into(),
        }
    }
}

impl Expr {
    pub fn column(qualifier: &str, name: &str) -> Expr {
        Expr::Column(ColumnRef::new(qualifier, name))
    }

    pub fn compare(lhs: Expr, op: CompareOp, rhs: Expr) -> Expr {
        Expr::Compare {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn group(e: Expr) -> Expr {
        Expr::Group(Box::new(e))
    }

    /// AND of the given conditions, dropping tautologies; `True` when nothing remains.
    pub fn and_all(parts: Vec<Expr>) -> Expr {
        let mut parts: Vec<Expr> = parts.into_iter().filter(|p| *p != Expr::True).collect();
        match parts.len() {
            0 => Expr::True,
            1 => parts.remove(0),
            _ => Expr::And(parts),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectItem {
    pub expr: SelectExpr,
    pub alias: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectExpr {
    Column(ColumnRef),
    /// `qualifier.*`
    AllColumns(String),
    Relation(RelationAggregate),
    Literal(Value),
}

/// Correlated subquery returning a JSON array of objects for the rows of `target_table`
/// whose `remote_col` equals the outer row's `local_col`.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationAggregate {
    pub fields: Vec<JsonField>,
    pub source_qualifier: String,
    pub target_table: String,
    pub target_alias: String,
    pub local_col: String,
    pub remote_col: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JsonField {
    pub key: String,
    pub value: JsonFieldValue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JsonFieldValue {
    Column(ColumnRef),
    Relation(Box<RelationAggregate>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub column: ColumnRef,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub table: String,
    pub filter: Expr,
    pub order: Vec<OrderItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Hands out subquery aliases `t1`, `t2`, … for one statement.
#[derive(Debug, Default)]
pub struct AliasGen {
    next: usize,
}

impl AliasGen {
    pub fn fresh(&mut self) -> String {
        self.next += 1;
        format!("t{}", self.next)
    }
}
