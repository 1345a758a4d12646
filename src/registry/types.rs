//! Raw model definitions as handed over by the registry generator (model name → definition).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Model name → definition, in declaration order.
pub type ModelDefinitions = IndexMap<String, ModelDefinition>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub table: String,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDefinition>,
    #[serde(default)]
    pub relations: IndexMap<String, RelationDefinition>,
    /// Sequence used by the enterprise backend to allocate missing key values. Defaults to `<table>_seq`.
    #[serde(default)]
    pub sequence: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Boolean,
    Date,
    Datetime,
    Time,
    Json,
    Binary,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    #[serde(rename = "type")]
    pub type_: ColumnType,
    #[serde(default)]
    pub is_primary_key: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
}

impl RelationKind {
    pub fn is_many(self) -> bool {
        matches!(self, RelationKind::HasMany)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDefinition {
    pub kind: RelationKind,
    pub from_column: String,
    pub to: RelationTarget,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationTarget {
    pub model: String,
    pub column: String,
}
