//! Resolved registry: definitions validated once and addressed by `ModelId`.

use crate::error::RegistryError;
use crate::registry::{ColumnType, RelationKind};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
}

#[derive(Clone, Debug)]
pub struct RelationInfo {
    pub name: String,
    pub kind: RelationKind,
    /// Column on the owning model (`local.from_column = remote.to_column`).
    pub from_column: String,
    /// Target model name as declared; kept for diagnostics when `target` is unresolved.
    pub target_model: String,
    pub to_column: String,
    /// None when the target model or its join column is not in the registry.
    pub target: Option<ModelId>,
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub id: ModelId,
    pub name: String,
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub relations: Vec<RelationInfo>,
    pub sequence: String,
}

impl ResolvedModel {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationInfo> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn pk_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Primary-key columns, failing fast when the model declares none.
    pub fn require_pk(&self) -> Result<Vec<&ColumnInfo>, RegistryError> {
        let pk: Vec<_> = self.pk_columns().collect();
        if pk.is_empty() {
            return Err(RegistryError::MissingPrimaryKey(self.name.clone()));
        }
        Ok(pk)
    }

    /// Output alias for a column of this model (`table_column`).
    pub fn alias(&self, column: &str) -> String {
        format!("{}_{}", self.table, column)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    models: Vec<ResolvedModel>,
    by_name: HashMap<String, ModelId>,
}

impl Registry {
    pub(crate) fn from_models(models: Vec<ResolvedModel>) -> Self {
        let by_name = models.iter().map(|m| (m.name.clone(), m.id)).collect();
        Registry { models, by_name }
    }

    pub fn model(&self, id: ModelId) -> &ResolvedModel {
        &self.models[id.0]
    }

    pub fn model_by_name(&self, name: &str) -> Result<&ResolvedModel, RegistryError> {
        self.by_name
            .get(name)
            .map(|id| self.model(*id))
            .ok_or_else(|| RegistryError::MissingModel(name.to_string()))
    }

    pub fn models(&self) -> impl Iterator<Item = &ResolvedModel> {
        self.models.iter()
    }

    /// Target model of a relation, or a registry error when it could not be resolved at load time.
    pub fn target(&self, owner: &ResolvedModel, rel: &RelationInfo) -> Result<&ResolvedModel, RegistryError> {
        rel.target
            .map(|id| self.model(id))
            .ok_or_else(|| RegistryError::MissingRelationTarget {
                model: owner.name.clone(),
                relation: rel.name.clone(),
                target: format!("{}.{}", rel.target_model, rel.to_column),
            })
    }
}
