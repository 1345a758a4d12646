//! create / update with relation cascades, all on one connection inside one transaction.

use crate::error::{AppError, BackendError};
use crate::query::{CreateArgs, Fields, RelationOp, RelationWrite, UpdateArgs, WritePayload};
use crate::registry::{Registry, ResolvedModel};
use crate::service::mapper::ResultMapper;
use crate::service::session::Session;
use crate::sql::ast::{AliasGen, Expr, Select};
use crate::sql::{self, compile_filter, equals_all, InsertPlan, KeySource, ProjectionCompiler, Statement};
use crate::value::Value;
use serde_json::Value as Json;

type KeyValues = Vec<(String, Value)>;

pub struct WriteService;

impl WriteService {
    /// Insert one row, cascade its relations, and return the row as stored.
    pub async fn create(
        registry: &Registry,
        session: &mut Session<'_>,
        model_name: &str,
        args: &CreateArgs,
    ) -> Result<Json, AppError> {
        let model = registry.model_by_name(model_name)?;
        model.require_pk()?;
        let payload = WritePayload::split(registry, model, &args.data, args.relations.as_ref())?;
        let values = column_values(model, &payload.columns);
        let plan = session.dialect().insert(model, &values)?;

        session.begin().await?;
        let result = Self::create_steps(registry, session, model, &payload, plan).await;
        session.settle(result).await
    }

    async fn create_steps(
        registry: &Registry,
        session: &mut Session<'_>,
        model: &ResolvedModel,
        payload: &WritePayload,
        plan: InsertPlan,
    ) -> Result<Json, AppError> {
        let outcome = session.execute(&plan.statement).await?;
        let mut parent = payload.columns.clone();
        match &plan.keys {
            KeySource::Returning => {
                let row = outcome.rows.first().ok_or_else(|| {
                    BackendError::Statement(format!("insert into {} returned no row", model.table))
                })?;
                for col in &model.columns {
                    if let Some(v) = row.get(&model.alias(&col.name)) {
                        parent.insert(col.name.clone(), v.clone());
                    }
                }
            }
            KeySource::OutBinds(binds) => {
                for (bind, column) in binds {
                    let v = outcome.out_binds.get(bind).ok_or_else(|| {
                        BackendError::Statement(format!("insert into {} did not report bind :{}", model.table, bind))
                    })?;
                    parent.insert(column.clone(), v.clone());
                }
            }
        }
        let key = key_values(model, &parent)?;
        tracing::debug!(model = %model.name, key = ?key, "inserted");

        Self::cascade(registry, session, model, &parent, &payload.relations).await?;
        Self::select_by_keys(registry, session, model, &[key])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} row after insert", model.name)))
    }

    /// Update every row matching `where`, cascade relations per row, and return the affected rows.
    pub async fn update(
        registry: &Registry,
        session: &mut Session<'_>,
        model_name: &str,
        args: &UpdateArgs,
    ) -> Result<Vec<Json>, AppError> {
        let model = registry.model_by_name(model_name)?;
        model.require_pk()?;
        let payload = WritePayload::split(registry, model, &args.data, args.relations.as_ref())?;
        let dialect = session.dialect();

        let mut aliases = AliasGen::default();
        let filter = compile_filter(registry, &mut aliases, model, args.where_.as_ref())?;
        let affected = sql::select(dialect, &Self::plain_select(registry, model, filter))?;
        let sets = column_values(model, &payload.columns);

        session.begin().await?;
        let result = Self::update_steps(registry, session, model, &payload, affected, &sets).await;
        session.settle(result).await
    }

    async fn update_steps(
        registry: &Registry,
        session: &mut Session<'_>,
        model: &ResolvedModel,
        payload: &WritePayload,
        affected: Statement,
        sets: &[(String, Value)],
    ) -> Result<Vec<Json>, AppError> {
        // keys are captured first so rows whose filtered columns change are still returned
        let rows = session.query(&affected).await?;
        let mut captured = Vec::with_capacity(rows.len());
        let mut parents: Vec<Fields> = Vec::with_capacity(rows.len());
        for row in ResultMapper::new(registry).map_rows(model, None, rows) {
            if let Json::Object(mut fields) = row {
                captured.push(key_values(model, &fields)?);
                for (k, v) in &payload.columns {
                    fields.insert(k.clone(), v.clone());
                }
                parents.push(fields);
            }
        }
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        // the UPDATE targets exactly the captured rows, not whatever matches the filter by now
        if !sets.is_empty() {
            let update = sql::update(session.dialect(), model, sets, &keys_filter(model, &captured))?;
            session.execute(&update).await?;
        }
        let mut keys = Vec::with_capacity(parents.len());
        for parent in &parents {
            Self::cascade(registry, session, model, parent, &payload.relations).await?;
            keys.push(key_values(model, parent)?);
        }
        Self::select_by_keys(registry, session, model, &keys).await
    }

    /// Apply relation operations for one parent row. The join column of the related row is always
    /// set from (or scoped by) the parent's `fromColumn` value.
    async fn cascade(
        registry: &Registry,
        session: &mut Session<'_>,
        owner: &ResolvedModel,
        parent: &Fields,
        relations: &[RelationWrite],
    ) -> Result<(), AppError> {
        let dialect = session.dialect();
        for write in relations {
            let Some(rel) = owner.relation(&write.relation) else {
                continue;
            };
            let target = registry.target(owner, rel)?;
            let join_ty = target.column(&rel.to_column).map(|c| c.ty);
            let join_value = Value::from_json(parent.get(&rel.from_column).unwrap_or(&Json::Null), join_ty);
            if join_value.is_null() {
                return Err(AppError::BadRequest(format!(
                    "cannot cascade {}.{}: {} is null on the parent row",
                    owner.name, rel.name, rel.from_column
                )));
            }
            let join = (rel.to_column.clone(), join_value);

            for op in &write.ops {
                let statement = match op {
                    RelationOp::Create(fields) => {
                        let mut values: KeyValues = column_values(target, fields)
                            .into_iter()
                            .filter(|(c, _)| *c != rel.to_column)
                            .collect();
                        values.push(join.clone());
                        dialect.insert(target, &values)?.statement
                    }
                    RelationOp::Update { key, fields } => {
                        let sets = column_values(target, fields);
                        if sets.is_empty() {
                            continue;
                        }
                        let mut scope = column_values(target, key);
                        scope.push(join.clone());
                        sql::update(dialect, target, &sets, &equals_all(&target.table, &scope))?
                    }
                    RelationOp::Delete { key } => {
                        let mut scope = key.as_ref().map(|k| column_values(target, k)).unwrap_or_default();
                        scope.push(join.clone());
                        sql::delete(dialect, target, &equals_all(&target.table, &scope))?
                    }
                };
                session.execute(&statement).await?;
            }
        }
        Ok(())
    }

    async fn select_by_keys(
        registry: &Registry,
        session: &mut Session<'_>,
        model: &ResolvedModel,
        keys: &[KeyValues],
    ) -> Result<Vec<Json>, AppError> {
        let filter = keys_filter(model, keys);
        let statement = sql::select(session.dialect(), &Self::plain_select(registry, model, filter))?;
        let rows = session.query(&statement).await?;
        Ok(ResultMapper::new(registry).map_rows(model, None, rows))
    }

    fn plain_select(registry: &Registry, model: &ResolvedModel, filter: Expr) -> Select {
        let mut aliases = AliasGen::default();
        Select {
            items: ProjectionCompiler::new(registry, &mut aliases).compile(model, None),
            table: model.table.clone(),
            filter,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

/// Declared columns of `model` found in `fields`, coerced to their column types. Other keys are ignored.
fn column_values(model: &ResolvedModel, fields: &Fields) -> KeyValues {
    fields
        .iter()
        .filter_map(|(k, v)| match model.column(k) {
            Some(col) => Some((k.clone(), Value::from_json(v, Some(col.ty)))),
            None => {
                tracing::debug!(model = %model.name, field = %k, "ignoring non-column write field");
                None
            }
        })
        .collect()
}

/// One key matches by equality; several are OR-ed, each grouped.
fn keys_filter(model: &ResolvedModel, keys: &[KeyValues]) -> Expr {
    match keys {
        [one] => equals_all(&model.table, one),
        many => Expr::Or(many.iter().map(|k| Expr::group(equals_all(&model.table, k))).collect()),
    }
}

fn key_values(model: &ResolvedModel, row: &Fields) -> Result<KeyValues, AppError> {
    model
        .require_pk()?
        .into_iter()
        .map(|pk| match row.get(&pk.name) {
            Some(v) if !v.is_null() => Ok((pk.name.clone(), Value::from_json(v, Some(pk.ty)))),
            _ => Err(AppError::Backend(BackendError::Statement(format!(
                "no value for key column {}.{}",
                model.table, pk.name
            )))),
        })
        .collect()
}
