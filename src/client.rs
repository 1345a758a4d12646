//! `Client`: the handle callers hold. Owns the registry and the backend; every call checks out its
//! own connection and releases it before returning.

use crate::backend::Backend;
use crate::error::AppError;
use crate::query::{CreateArgs, FindFirstArgs, FindManyArgs, UpdateArgs};
use crate::registry::Registry;
use crate::service::{ReadService, Reply, Session, WriteService};
use crate::sql::Dialect;
use crate::value::Value;
use futures::stream::{self, StreamExt};
use serde_json::Value as Json;
use std::sync::Arc;

#[derive(Clone)]
pub struct Client {
    registry: Arc<Registry>,
    backend: Arc<dyn Backend>,
}

impl Client {
    pub fn new(registry: Registry, backend: Arc<dyn Backend>) -> Self {
        Client {
            registry: Arc::new(registry),
            backend,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.backend.dialect()
    }

    /// Positional placeholder for `query_raw` in this backend's syntax (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        self.dialect().placeholder(index)
    }

    pub async fn find_many(&self, model: &str, args: FindManyArgs) -> Result<Reply<Vec<Json>>, AppError> {
        let (sql, result) = self.read(model, &args).await?;
        Reply::settle(args.debug, sql, result)
    }

    pub async fn find_first(&self, model: &str, args: FindFirstArgs) -> Result<Reply<Option<Json>>, AppError> {
        let args: FindManyArgs = args.into();
        let (sql, result) = self.read(model, &args).await?;
        Reply::settle(args.debug, sql, result.map(|rows| rows.into_iter().next()))
    }

    /// Run several reads with at most `concurrency` in flight. Results keep the input order.
    pub async fn find_many_batch(
        &self,
        requests: Vec<(String, FindManyArgs)>,
        concurrency: usize,
    ) -> Vec<Result<Reply<Vec<Json>>, AppError>> {
        stream::iter(requests)
            .map(|(model, args)| {
                let client = self.clone();
                async move { client.find_many(&model, args).await }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    pub async fn create(&self, model: &str, args: CreateArgs) -> Result<Reply<Json>, AppError> {
        let mut session = match Session::open(self.backend()).await {
            Ok(s) => s,
            Err(e) => return Reply::settle(args.debug, String::new(), Err(e.into())),
        };
        let result = WriteService::create(&self.registry, &mut session, model, &args).await;
        Reply::settle(args.debug, session.sql(), result)
    }

    pub async fn update(&self, model: &str, args: UpdateArgs) -> Result<Reply<Vec<Json>>, AppError> {
        let mut session = match Session::open(self.backend()).await {
            Ok(s) => s,
            Err(e) => return Reply::settle(args.debug, String::new(), Err(e.into())),
        };
        let result = WriteService::update(&self.registry, &mut session, model, &args).await;
        Reply::settle(args.debug, session.sql(), result)
    }

    /// Execute caller-supplied SQL with positional parameters. Nothing is compiled or escaped here.
    pub async fn query_raw(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Json>, AppError> {
        let mut session = Session::open(self.backend()).await?;
        ReadService::query_raw(&mut session, sql, params).await
    }

    /// Compile first (no connection needed), then run on a fresh connection.
    async fn read(&self, model: &str, args: &FindManyArgs) -> Result<(String, Result<Vec<Json>, AppError>), AppError> {
        let plan = ReadService::plan(&self.registry, self.dialect(), model, args)?;
        let mut session = match Session::open(self.backend()).await {
            Ok(s) => s,
            Err(e) => return Ok((String::new(), Err(e.into()))),
        };
        let result = ReadService::run(&self.registry, &mut session, &plan).await;
        Ok((session.sql(), result))
    }
}
