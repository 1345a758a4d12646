//! Call arguments for reads and writes.

use crate::query::{Fields, Filter, OrderSpec, SelectionTree};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    #[serde(default)]
    pub select: Option<SelectionTree>,
    #[serde(default, rename = "where")]
    pub where_: Option<Filter>,
    #[serde(default)]
    pub order_by: Option<OrderSpec>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub debug: bool,
}

/// Same as `FindManyArgs` without pagination; at most one row is returned.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindFirstArgs {
    #[serde(default)]
    pub select: Option<SelectionTree>,
    #[serde(default, rename = "where")]
    pub where_: Option<Filter>,
    #[serde(default)]
    pub order_by: Option<OrderSpec>,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateArgs {
    pub data: Fields,
    #[serde(default)]
    pub relations: Option<Fields>,
    #[serde(default)]
    pub debug: bool,
}

/// A missing `where` updates every row; supplying one is the caller's responsibility.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateArgs {
    pub data: Fields,
    #[serde(default, rename = "where")]
    pub where_: Option<Filter>,
    #[serde(default)]
    pub relations: Option<Fields>,
    #[serde(default)]
    pub debug: bool,
}

impl From<FindFirstArgs> for FindManyArgs {
    fn from(a: FindFirstArgs) -> Self {
        FindManyArgs {
            select: a.select,
            where_: a.where_,
            order_by: a.order_by,
            limit: Some(1),
            skip: None,
            debug: a.debug,
        }
    }
}
