//! Values that may become SQL literals. Caller JSON is coerced here using the declared column type.

use crate::registry::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as Json;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Json(Json),
    Binary(Vec<u8>),
    Array(Vec<Value>),
}

impl Value {
    /// Convert caller JSON into a typed value. `ty` is the declared type of the column the value is compared
    /// against or written to; strings on temporal columns are parsed, anything on a json column stays JSON.
    pub fn from_json(v: &Json, ty: Option<ColumnType>) -> Value {
        match (v, ty) {
            (Json::Null, _) => Value::Null,
            (_, Some(ColumnType::Json)) => Value::Json(v.clone()),
            (Json::Array(items), Some(ColumnType::Binary)) => {
                let bytes: Option<Vec<u8>> = items
                    .iter()
                    .map(|i| i.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect();
                match bytes {
                    Some(b) => Value::Binary(b),
                    None => Value::Array(items.iter().map(|i| Value::from_json(i, None)).collect()),
                }
            }
            (Json::Array(items), _) => Value::Array(items.iter().map(|i| Value::from_json(i, ty)).collect()),
            (Json::Bool(b), _) => Value::Bool(*b),
            (Json::Number(n), _) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            (Json::String(s), Some(ColumnType::Date)) => parse_date(s).map(Value::Date).unwrap_or_else(|| Value::Text(s.clone())),
            (Json::String(s), Some(ColumnType::Datetime)) => {
                parse_datetime(s).map(Value::DateTime).unwrap_or_else(|| Value::Text(s.clone()))
            }
            (Json::String(s), Some(ColumnType::Time)) => parse_time(s).map(Value::Time).unwrap_or_else(|| Value::Text(s.clone())),
            (Json::String(s), _) => Value::Text(s.clone()),
            (Json::Object(_), _) => Value::Json(v.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JSON form used when a value travels back to the caller (e.g. a captured key).
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(d) => Json::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Time(t) => Json::String(t.format("%H:%M:%S%.f").to_string()),
            Value::Json(j) => j.clone(),
            Value::Binary(b) => Json::Array(b.iter().map(|n| Json::from(*n)).collect()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Text(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::Json(_) => "json",
            Value::Binary(_) => "binary",
            Value::Array(_) => "array",
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|d| d.date()))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::DateTime(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_on_temporal_columns_become_temporal_values() {
        assert_eq!(
            Value::from_json(&json!("2024-02-29"), Some(ColumnType::Date)),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        let dt = Value::from_json(&json!("2024-01-02T03:04:05Z"), Some(ColumnType::Datetime));
        assert_eq!(
            dt,
            Value::DateTime(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap())
        );
        assert_eq!(
            Value::from_json(&json!("12:30"), Some(ColumnType::Time)),
            Value::Time(NaiveTime::from_hms_opt(12, 30, 0).unwrap())
        );
    }

    #[test]
    fn unparsable_temporal_strings_stay_text() {
        assert_eq!(
            Value::from_json(&json!("yesterday"), Some(ColumnType::Date)),
            Value::Text("yesterday".into())
        );
    }

    #[test]
    fn json_columns_keep_structure() {
        let v = json!({ "a": [1, 2] });
        assert_eq!(Value::from_json(&v, Some(ColumnType::Json)), Value::Json(v.clone()));
        assert_eq!(Value::from_json(&json!([1, 2]), Some(ColumnType::Json)), Value::Json(json!([1, 2])));
    }

    #[test]
    fn numbers_prefer_integers() {
        assert_eq!(Value::from_json(&json!(42), None), Value::Int(42));
        assert_eq!(Value::from_json(&json!(1.5), None), Value::Float(1.5));
    }
}
