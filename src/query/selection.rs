//! SelectionTree: which columns and relations to project.

use crate::error::AppError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionTree {
    pub entries: IndexMap<String, Selection>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// Column included, or relation with every remote column.
    All,
    Nested(SelectionTree),
}

impl SelectionTree {
    pub fn from_json(v: &Json) -> Result<SelectionTree, AppError> {
        let Json::Object(map) = v else {
            return Err(AppError::BadRequest("select must be a JSON object".into()));
        };
        let mut entries = IndexMap::with_capacity(map.len());
        for (name, sel) in map {
            match sel {
                Json::Bool(true) => {
                    entries.insert(name.clone(), Selection::All);
                }
                Json::Bool(false) | Json::Null => {}
                Json::Object(inner) => {
                    // `{ posts: { select: { ... } } }` is accepted as well as `{ posts: { ... } }`.
                    let inner_v = match inner.get("select") {
                        Some(s @ Json::Object(_)) if inner.len() == 1 => s,
                        _ => sel,
                    };
                    entries.insert(name.clone(), Selection::Nested(Self::from_json(inner_v)?));
                }
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "select.{} must be true, false or an object",
                        name
                    )))
                }
            }
        }
        Ok(SelectionTree { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Selection> {
        self.entries.get(name)
    }
}

impl Selection {
    /// Nested tree if one was given; `None` means all columns of the target.
    pub fn nested(&self) -> Option<&SelectionTree> {
        match self {
            Selection::All => None,
            Selection::Nested(tree) => Some(tree),
        }
    }
}

impl<'de> Deserialize<'de> for SelectionTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Json::deserialize(deserializer)?;
        SelectionTree::from_json(&v).map_err(serde::de::Error::custom)
    }
}
