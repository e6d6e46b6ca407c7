use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$any")] Any,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
