//! Convert `Value` to something sqlx can bind. Only raw statements carry parameters.

use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Time(NaiveTime),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl From<&Value> for PgBindValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Int(i) => PgBindValue::I64(*i),
            Value::Float(f) => PgBindValue::F64(*f),
            Value::Text(s) => PgBindValue::Text(s.clone()),
            Value::Date(d) => PgBindValue::Date(*d),
            Value::DateTime(d) => PgBindValue::Timestamp(*d),
            Value::Time(t) => PgBindValue::Time(*t),
            Value::Json(j) => PgBindValue::Json(j.clone()),
            Value::Binary(b) => PgBindValue::Bytes(b.clone()),
            Value::Array(_) => PgBindValue::Json(v.to_json()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf)?,
            PgBindValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
            PgBindValue::Timestamp(d) => <NaiveDateTime as Encode<Postgres>>::encode_by_ref(d, buf)?,
            PgBindValue::Time(t) => <NaiveTime as Encode<Postgres>>::encode_by_ref(t, buf)?,
            PgBindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
            PgBindValue::Bytes(b) => <&[u8] as Encode<Postgres>>::encode_by_ref(&b.as_slice(), buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        let name = match self {
            PgBindValue::Null | PgBindValue::Text(_) => return None,
            PgBindValue::Bool(_) => "BOOL",
            PgBindValue::I64(_) => "INT8",
            PgBindValue::F64(_) => "FLOAT8",
            PgBindValue::Date(_) => "DATE",
            PgBindValue::Timestamp(_) => "TIMESTAMP",
            PgBindValue::Time(_) => "TIME",
            PgBindValue::Json(_) => "JSONB",
            PgBindValue::Bytes(_) => "BYTEA",
        };
        Some(PgTypeInfo::with_name(name))
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_bind_as_json() {
        let v = Value::Array(vec![Value::Int(1), Value::Text("a".into())]);
        match PgBindValue::from(&v) {
            PgBindValue::Json(j) => assert_eq!(j, serde_json::json!([1, "a"])),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn typed_values_declare_their_type() {
        assert!(PgBindValue::from(&Value::Int(3)).produces().is_some());
        assert!(PgBindValue::from(&Value::Null).produces().is_none());
    }
}
