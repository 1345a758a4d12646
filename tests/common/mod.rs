#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value as Json;
use std::sync::{Arc, Mutex};
use strata_sdk::{
    load_from_json_str, resolve, Backend, BackendError, Client, Connection, Dialect, OracleDialect, Outcome,
    PostgresDialect, Registry, Row, Statement, Value,
};

pub const MODELS: &str = r#"{
    "user": {
        "table": "users",
        "columns": {
            "id": { "type": "number", "isPrimaryKey": true },
            "name": { "type": "text" }
        },
        "relations": {
            "posts": { "kind": "has_many", "fromColumn": "id", "to": { "model": "post", "column": "author_id" } },
            "profile": { "kind": "has_one", "fromColumn": "id", "to": { "model": "profile", "column": "user_id" } }
        }
    },
    "post": {
        "table": "posts",
        "columns": {
            "id": { "type": "number", "isPrimaryKey": true },
            "author_id": { "type": "number" },
            "title": { "type": "text" },
            "published": { "type": "boolean" }
        },
        "relations": {
            "author": { "kind": "belongs_to", "fromColumn": "author_id", "to": { "model": "user", "column": "id" } }
        }
    },
    "profile": {
        "table": "profiles",
        "columns": {
            "user_id": { "type": "number", "isPrimaryKey": true },
            "bio": { "type": "text" }
        }
    },
    "pair": {
        "table": "pairs",
        "columns": {
            "a": { "type": "number", "isPrimaryKey": true },
            "b": { "type": "number", "isPrimaryKey": true },
            "label": { "type": "text" }
        }
    },
    "event": {
        "table": "events",
        "columns": {
            "message": { "type": "text" }
        }
    }
}"#;

pub fn registry() -> Registry {
    resolve(&load_from_json_str(MODELS).unwrap()).unwrap()
}

enum Response {
    Rows(Vec<Row>),
    Binds(Row),
    Fail(String),
    Hang,
}

struct Rule {
    needle: String,
    response: Response,
}

#[derive(Default)]
struct Script {
    log: Vec<String>,
    params: Vec<Vec<Value>>,
    rules: Vec<Rule>,
    open: usize,
    acquired: usize,
}

/// In-memory backend: records every statement and answers from scripted rules. A rule matches the
/// first statement whose SQL contains its needle and is consumed by it; unmatched statements succeed
/// with no rows.
#[derive(Clone)]
pub struct ScriptedBackend {
    dialect: Arc<dyn Dialect>,
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn postgres() -> Self {
        Self::with_dialect(Arc::new(PostgresDialect))
    }

    pub fn oracle() -> Self {
        Self::with_dialect(Arc::new(OracleDialect))
    }

    fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        ScriptedBackend {
            dialect,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn client(&self) -> Client {
        Client::new(registry(), Arc::new(self.clone()))
    }

    fn push(&self, needle: &str, response: Response) {
        self.script.lock().unwrap().rules.push(Rule {
            needle: needle.to_string(),
            response,
        });
    }

    pub fn on_rows(&self, needle: &str, rows: Json) {
        let rows = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect();
        self.push(needle, Response::Rows(rows));
    }

    pub fn on_binds(&self, needle: &str, binds: Json) {
        self.push(needle, Response::Binds(binds.as_object().unwrap().clone()));
    }

    pub fn fail_on(&self, needle: &str) {
        self.push(needle, Response::Fail(format!("scripted failure on {}", needle)));
    }

    /// The matching statement never completes; used to cancel an operation midway.
    pub fn hang_on(&self, needle: &str) {
        self.push(needle, Response::Hang);
    }

    pub fn log(&self) -> Vec<String> {
        self.script.lock().unwrap().log.clone()
    }

    pub fn params(&self) -> Vec<Vec<Value>> {
        self.script.lock().unwrap().params.clone()
    }

    pub fn open_connections(&self) -> usize {
        self.script.lock().unwrap().open
    }

    pub fn acquired(&self) -> usize {
        self.script.lock().unwrap().acquired
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    async fn acquire(&self) -> Result<Box<dyn Connection>, BackendError> {
        let mut script = self.script.lock().unwrap();
        script.open += 1;
        script.acquired += 1;
        Ok(Box::new(ScriptedConnection {
            dialect: self.dialect.clone(),
            script: self.script.clone(),
            in_transaction: false,
        }))
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

struct ScriptedConnection {
    dialect: Arc<dyn Dialect>,
    script: Arc<Mutex<Script>>,
    in_transaction: bool,
}

enum Step {
    Done(Result<Outcome, BackendError>),
    Hang,
}

impl ScriptedConnection {
    fn step(&self, sql: &str, params: Vec<Value>) -> Step {
        let mut script = self.script.lock().unwrap();
        script.log.push(sql.to_string());
        script.params.push(params);
        let Some(i) = script.rules.iter().position(|r| sql.contains(&r.needle)) else {
            return Step::Done(Ok(Outcome::default()));
        };
        Step::Done(match script.rules.remove(i).response {
            Response::Rows(rows) => Ok(Outcome {
                rows,
                out_binds: Row::new(),
            }),
            Response::Binds(out_binds) => Ok(Outcome {
                rows: Vec::new(),
                out_binds,
            }),
            Response::Fail(msg) => Err(BackendError::Statement(msg)),
            Response::Hang => return Step::Hang,
        })
    }

    async fn run(&self, sql: &str, params: Vec<Value>) -> Result<Outcome, BackendError> {
        match self.step(sql, params) {
            Step::Done(result) => result,
            Step::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, BackendError> {
        self.run(&statement.sql, statement.params.clone()).await.map(|o| o.rows)
    }

    async fn execute(&mut self, statement: &Statement) -> Result<Outcome, BackendError> {
        self.run(&statement.sql, statement.params.clone()).await
    }

    async fn begin(&mut self) -> Result<(), BackendError> {
        if let Some(sql) = self.dialect.begin_transaction() {
            self.run(sql, Vec::new()).await?;
        }
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BackendError> {
        self.in_transaction = false;
        self.run("COMMIT", Vec::new()).await.map(|_| ())
    }

    async fn rollback(&mut self) -> Result<(), BackendError> {
        self.in_transaction = false;
        self.run("ROLLBACK", Vec::new()).await.map(|_| ())
    }
}

/// Like a pooled driver connection: an open transaction is rolled back on release.
impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        if let Ok(mut script) = self.script.lock() {
            if self.in_transaction {
                script.log.push("ROLLBACK".to_string());
                script.params.push(Vec::new());
            }
            script.open -= 1;
        }
    }
}
