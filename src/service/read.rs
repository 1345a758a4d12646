//! findMany / findFirst: compile once, run one SELECT, map the rows.

use crate::error::AppError;
use crate::query::{FindManyArgs, SelectionTree};
use crate::registry::{ModelId, Registry};
use crate::service::mapper::ResultMapper;
use crate::service::session::Session;
use crate::sql::ast::{AliasGen, Select};
use crate::sql::{self, compile_filter, compile_order, Dialect, ProjectionCompiler, Statement};
use crate::value::Value;
use serde_json::Value as Json;

/// A compiled read, ready to run on any session of the same dialect.
#[derive(Clone, Debug)]
pub struct ReadPlan {
    pub model: ModelId,
    pub selection: Option<SelectionTree>,
    pub statement: Statement,
}

pub struct ReadService;

impl ReadService {
    /// Compile without touching the backend; registry and compile errors surface here.
    pub fn plan(
        registry: &Registry,
        dialect: &dyn Dialect,
        model_name: &str,
        args: &FindManyArgs,
    ) -> Result<ReadPlan, AppError> {
        let model = registry.model_by_name(model_name)?;
        let mut aliases = AliasGen::default();
        let items = ProjectionCompiler::new(registry, &mut aliases).compile(model, args.select.as_ref());
        let filter = compile_filter(registry, &mut aliases, model, args.where_.as_ref())?;
        let select = Select {
            items,
            table: model.table.clone(),
            filter,
            order: compile_order(model, args.order_by.as_ref()),
            limit: args.limit,
            offset: args.skip,
        };
        Ok(ReadPlan {
            model: model.id,
            selection: args.select.clone(),
            statement: sql::select(dialect, &select)?,
        })
    }

    pub async fn run(registry: &Registry, session: &mut Session<'_>, plan: &ReadPlan) -> Result<Vec<Json>, AppError> {
        let rows = session.query(&plan.statement).await?;
        let model = registry.model(plan.model);
        Ok(ResultMapper::new(registry).map_rows(model, plan.selection.as_ref(), rows))
    }

    /// Caller-supplied SQL with positional parameters; rows are returned as labelled by the database.
    pub async fn query_raw(session: &mut Session<'_>, sql: &str, params: Vec<Value>) -> Result<Vec<Json>, AppError> {
        let rows = session.query(&Statement::with_params(sql, params)).await?;
        Ok(rows.into_iter().map(Json::Object).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{load_from_json_str, resolve};
    use crate::sql::{OracleDialect, PostgresDialect};
    use serde_json::json;

    fn registry() -> Registry {
        resolve(
            &load_from_json_str(
                r#"{ "user": { "table": "users", "columns": {
                    "id": { "type": "number", "isPrimaryKey": true },
                    "name": { "type": "text" },
                    "age": { "type": "number" } } } }"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn args(v: serde_json::Value) -> FindManyArgs {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn find_many_statement_on_both_dialects() {
        let registry = registry();
        let a = args(json!({
            "select": { "name": true },
            "where": { "age": { "gte": 18 } },
            "orderBy": { "name": "desc" },
            "limit": 10,
            "skip": 20
        }));
        let pg = ReadService::plan(&registry, &PostgresDialect, "user", &a).unwrap();
        assert_eq!(
            pg.statement.sql,
            "SELECT \"users\".\"name\" AS \"users_name\" FROM \"users\" WHERE \"users\".\"age\" >= 18 \
             ORDER BY \"users\".\"name\" DESC LIMIT 10 OFFSET 20"
        );
        let ora = ReadService::plan(&registry, &OracleDialect, "user", &a).unwrap();
        assert!(ora
            .statement
            .sql
            .ends_with("ORDER BY \"users\".\"name\" DESC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"));
    }

    #[test]
    fn find_first_is_limited_to_one_row() {
        let registry = registry();
        let first: crate::query::FindFirstArgs = serde_json::from_value(json!({ "where": { "id": 3 } })).unwrap();
        let plan = ReadService::plan(&registry, &PostgresDialect, "user", &first.into()).unwrap();
        assert!(plan.statement.sql.ends_with("WHERE \"users\".\"id\" = 3 LIMIT 1"));
    }

    #[test]
    fn unknown_model_is_a_registry_error() {
        let registry = registry();
        assert!(matches!(
            ReadService::plan(&registry, &PostgresDialect, "ghost", &FindManyArgs::default()),
            Err(AppError::Registry(crate::error::RegistryError::MissingModel(_)))
        ));
    }
}
