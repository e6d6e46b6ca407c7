use serde_json::Value;

use super::error::FilterError;
use super::is_valid_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            // "created_at desc, title"
            Value::String(s) => Self::parse_order_string(s),
            _ => return Err(FilterError::InvalidOrder("ORDER must be a string".to_string())),
        };

        if let Some(bad) = infos.iter().find(|i| !is_valid_identifier(&i.column)) {
            return Err(FilterError::InvalidColumn(bad.column.clone()));
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        // split on commas, then each token into column and direction
        s.split(',')
            .filter_map(|part| {
                let mut it = part.split_whitespace();
                let column = it.next()?;
                Some(FilterOrderInfo {
                    column: column.to_string(),
                    sort: Self::parse_direction(it.next().unwrap_or("asc")),
                })
            })
            .collect()
    }

    fn parse_direction(dir: &str) -> SortDirection {
        if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
