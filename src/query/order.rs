//! OrderSpec: ordered column → direction pairs.

use crate::error::AppError;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderSpec(pub Vec<(String, Direction)>);

impl OrderSpec {
    /// Accepts `{ "a": "asc", "b": "desc" }` (key order kept) or `[{ "a": "asc" }, { "b": "desc" }]`.
    pub fn from_json(v: &Json) -> Result<OrderSpec, AppError> {
        let mut out = Vec::new();
        match v {
            Json::Object(map) => {
                for (col, dir) in map {
                    out.push((col.clone(), parse_direction(col, dir)?));
                }
            }
            Json::Array(items) => {
                for item in items {
                    out.extend(Self::from_json(item)?.0);
                }
            }
            Json::Null => {}
            _ => return Err(AppError::BadRequest("orderBy must be an object or an array of objects".into())),
        }
        Ok(OrderSpec(out))
    }
}

fn parse_direction(col: &str, v: &Json) -> Result<Direction, AppError> {
    match v.as_str().map(str::to_ascii_lowercase).as_deref() {
        Some("asc") => Ok(Direction::Asc),
        Some("desc") => Ok(Direction::Desc),
        _ => Err(AppError::BadRequest(format!("orderBy.{} must be \"asc\" or \"desc\"", col))),
    }
}

impl<'de> Deserialize<'de> for OrderSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Json::deserialize(deserializer)?;
        OrderSpec::from_json(&v).map_err(serde::de::Error::custom)
    }
}
