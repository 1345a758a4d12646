//! FilterTree: field conditions combined with AND / OR / NOT.

use crate::error::AppError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as Json};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    /// Sibling clauses of one node; they are combined with AND.
    pub clauses: Vec<Clause>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Field(String, Condition),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Bare value under a field name: equality shorthand (arrays mean membership).
    Equals(Json),
    Operators(Operators),
    /// Object that is not an operator map: a filter on a relation's target model.
    Nested { filter: Filter, raw: Json },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Operators {
    pub ops: Vec<(Operator, Json)>,
    /// `mode: "insensitive"` turns contains/startsWith/endsWith into case-insensitive matches.
    pub insensitive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Nin,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub fn parse(key: &str) -> Option<Operator> {
        Some(match key {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "like" => Operator::Like,
            "ilike" => Operator::Ilike,
            "in" => Operator::In,
            "nin" => Operator::Nin,
            "contains" => Operator::Contains,
            "startsWith" => Operator::StartsWith,
            "endsWith" => Operator::EndsWith,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
        }
    }
}

const MODE_KEY: &str = "mode";

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn from_json(v: &Json) -> Result<Filter, AppError> {
        match v {
            Json::Null => Ok(Filter::default()),
            Json::Object(map) => Self::from_map(map),
            _ => Err(AppError::BadRequest("filter must be a JSON object".into())),
        }
    }

    fn from_map(map: &Map<String, Json>) -> Result<Filter, AppError> {
        let mut clauses = Vec::with_capacity(map.len());
        for (key, value) in map {
            let clause = match key.as_str() {
                "AND" => Clause::And(Self::list(value)?),
                "OR" => Clause::Or(Self::list(value)?),
                "NOT" => match value {
                    Json::Array(_) => Clause::Not(Box::new(Filter {
                        clauses: vec![Clause::And(Self::list(value)?)],
                    })),
                    _ => Clause::Not(Box::new(Self::from_json(value)?)),
                },
                _ => Clause::Field(key.clone(), Condition::from_json(value)?),
            };
            clauses.push(clause);
        }
        Ok(Filter { clauses })
    }

    /// AND/OR accept an array of filters or a single filter object.
    fn list(v: &Json) -> Result<Vec<Filter>, AppError> {
        match v {
            Json::Array(items) => items.iter().map(Self::from_json).collect(),
            _ => Ok(vec![Self::from_json(v)?]),
        }
    }
}

impl Condition {
    fn from_json(v: &Json) -> Result<Condition, AppError> {
        let Json::Object(map) = v else {
            return Ok(Condition::Equals(v.clone()));
        };
        let is_operator_map = !map.is_empty()
            && map.keys().all(|k| k == MODE_KEY || Operator::parse(k).is_some())
            && map.keys().any(|k| k != MODE_KEY);
        if map.is_empty() || is_operator_map {
            let mut ops = Operators::default();
            for (k, arg) in map {
                if k == MODE_KEY {
                    ops.insensitive = arg.as_str().map(|m| m.eq_ignore_ascii_case("insensitive")).unwrap_or(false);
                } else if let Some(op) = Operator::parse(k) {
                    ops.ops.push((op, arg.clone()));
                }
            }
            return Ok(Condition::Operators(ops));
        }
        Ok(Condition::Nested {
            filter: Filter::from_map(map)?,
            raw: v.clone(),
        })
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Json::deserialize(deserializer)?;
        Filter::from_json(&v).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_operator_maps_and_logical_keys() {
        let f = Filter::from_json(&json!({
            "age": { "gte": 18 },
            "OR": [{ "status": "active" }, { "status": "pending" }]
        }))
        .unwrap();
        assert_eq!(f.clauses.len(), 2);
        match &f.clauses[0] {
            Clause::Field(name, Condition::Operators(ops)) => {
                assert_eq!(name, "age");
                assert_eq!(ops.ops, vec![(Operator::Gte, json!(18))]);
            }
            other => panic!("unexpected clause {:?}", other),
        }
        match &f.clauses[1] {
            Clause::Or(children) => assert_eq!(children.len(), 2),
            other => panic!("unexpected clause {:?}", other),
        }
    }

    #[test]
    fn object_with_non_operator_keys_is_nested() {
        let f = Filter::from_json(&json!({ "posts": { "title": { "contains": "rust" } } })).unwrap();
        assert!(matches!(&f.clauses[0], Clause::Field(_, Condition::Nested { .. })));
    }

    #[test]
    fn mode_alone_is_not_an_operator_map() {
        let f = Filter::from_json(&json!({ "name": { "contains": "a", "mode": "insensitive" } })).unwrap();
        match &f.clauses[0] {
            Clause::Field(_, Condition::Operators(ops)) => assert!(ops.insensitive),
            other => panic!("unexpected clause {:?}", other),
        }
        let f = Filter::from_json(&json!({ "profile": { "mode": "dark" } })).unwrap();
        assert!(matches!(&f.clauses[0], Clause::Field(_, Condition::Nested { .. })));
    }

    #[test]
    fn rejects_non_object_filters() {
        assert!(Filter::from_json(&json!([1, 2])).is_err());
        assert!(Filter::from_json(&json!(null)).unwrap().is_empty());
    }
}
