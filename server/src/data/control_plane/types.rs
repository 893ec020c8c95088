use std::fmt;

use serde::{Deserialize, Serialize};

/// `{ "list": [...], "total": n }` envelope of control-plane list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub list: Option<Vec<T>>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> ListResponse<T> {
    /// Items of the page; a missing or null `list` is empty
    pub fn into_items(self) -> Vec<T> {
        self.list.unwrap_or_default()
    }
}

/// Resource ids arrive as strings or numbers depending on the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ResourceId {
    Text(String),
    Number(i64),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Text(s) => f.write_str(s),
            ResourceId::Number(n) => write!(f, "{}", n),
        }
    }
}
