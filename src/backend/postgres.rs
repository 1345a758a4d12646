//! Row-store backend over a sqlx `PgPool`.

use crate::backend::{Backend, Connection, Outcome, Row};
use crate::error::BackendError;
use crate::settings::Settings;
use crate::sql::{Dialect, PgBindValue, PostgresDialect, Statement};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value as Json;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Transaction};

#[derive(Clone, Debug)]
pub struct PgBackend {
    pool: PgPool,
    dialect: PostgresDialect,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        PgBackend {
            pool,
            dialect: PostgresDialect,
        }
    }

    pub async fn connect(settings: &Settings) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.database_url)
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Backend for PgBackend {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn acquire(&self) -> Result<Box<dyn Connection>, BackendError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(Box::new(PgConnection {
            pool: self.pool.clone(),
            slot: Slot::Idle(conn),
        }))
    }

    async fn ping(&self) -> Result<(), BackendError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// What the connection currently holds. A `Transaction` dropped before commit is rolled back by sqlx
/// when its connection returns to the pool.
enum Slot {
    Idle(PoolConnection<Postgres>),
    Tx(Transaction<'static, Postgres>),
    Released,
}

struct PgConnection {
    pool: PgPool,
    slot: Slot,
}

impl PgConnection {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Row>, BackendError> {
        if !statement.binds.is_empty() {
            return Err(BackendError::Statement(
                "named OUT binds are not supported by the postgres backend".into(),
            ));
        }
        if let Slot::Released = self.slot {
            let conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| BackendError::Connection(e.to_string()))?;
            self.slot = Slot::Idle(conn);
        }
        // literals are inlined; plans are never reused
        let mut query = sqlx::query(&statement.sql).persistent(false);
        for p in &statement.params {
            query = query.bind(PgBindValue::from(p));
        }
        let rows = match &mut self.slot {
            Slot::Idle(conn) => query.fetch_all(&mut **conn).await?,
            Slot::Tx(tx) => query.fetch_all(&mut **tx).await?,
            Slot::Released => Vec::new(),
        };
        Ok(rows.iter().map(row_to_json).collect())
    }

    fn take_tx(&mut self) -> Option<Transaction<'static, Postgres>> {
        match std::mem::replace(&mut self.slot, Slot::Released) {
            Slot::Tx(tx) => Some(tx),
            other => {
                self.slot = other;
                None
            }
        }
    }
}

#[async_trait]
impl Connection for PgConnection {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, BackendError> {
        self.run(statement).await
    }

    async fn execute(&mut self, statement: &Statement) -> Result<Outcome, BackendError> {
        Ok(Outcome {
            rows: self.run(statement).await?,
            out_binds: Row::new(),
        })
    }

    /// Hands the idle connection back and opens a pool transaction in its place.
    async fn begin(&mut self) -> Result<(), BackendError> {
        if let Slot::Tx(_) = self.slot {
            return Err(BackendError::Statement("transaction already open".into()));
        }
        self.slot = Slot::Released;
        let tx = self.pool.begin().await?;
        self.slot = Slot::Tx(tx);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BackendError> {
        match self.take_tx() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(BackendError::Statement("commit without an open transaction".into())),
        }
    }

    async fn rollback(&mut self) -> Result<(), BackendError> {
        match self.take_tx() {
            Some(tx) => Ok(tx.rollback().await?),
            None => Ok(()),
        }
    }
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Json {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Json::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Json::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Json::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Json::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Json::Number(n);
        }
    }
    if let Ok(Some(d)) = row.try_get::<Option<rust_decimal::Decimal>, _>(name) {
        if d.fract().is_zero() {
            if let Some(i) = d.to_i64() {
                return Json::Number(i.into());
            }
        }
        return d
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(d.to_string()));
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Json::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Json::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Json::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Json::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Json::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(t)) = row.try_get::<Option<chrono::NaiveTime>, _>(name) {
        return Json::String(t.format("%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Json::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Json>, _>(name) {
        return j;
    }
    if let Ok(Some(b)) = row.try_get::<Option<Vec<u8>>, _>(name) {
        return Json::Array(b.into_iter().map(Json::from).collect());
    }
    Json::Null
}
