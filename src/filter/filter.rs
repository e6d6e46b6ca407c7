use std::collections::HashSet;

use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::is_valid_identifier;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

/// SELECT builder over one table driven by [`FilterData`]. No LIMIT/OFFSET:
/// callers always receive the full matching set.
pub struct Filter {
    table_name: String,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    uuid_columns: HashSet<String>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            uuid_columns: HashSet::new(),
        })
    }

    /// Declare columns of type `uuid`. Their placeholders are cast to `uuid`;
    /// all other parameters stay text.
    pub fn uuid_columns<I, S>(&mut self, columns: I) -> Result<&mut Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if !is_valid_identifier(&column) {
                return Err(FilterError::InvalidColumn(column));
            }
            self.uuid_columns.insert(column);
        }
        Ok(self)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);

        let query = [
            format!("SELECT * FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match &self.where_data {
            Some(where_data) => FilterWhere::generate(where_data, 0, &self.uuid_columns)?,
            None => ("1=1".to_string(), vec![]),
        };
        Ok(SqlResult { query, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_full_select() {
        let mut filter = Filter::new("notes").unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({ "user_id": "abc", "is_pinned": false })),
                order: Some(json!("created_at desc")),
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"notes\" WHERE \"is_pinned\" = $1 AND \"user_id\" = $2 ORDER BY \"created_at\" DESC"
        );
        assert_eq!(sql.params, vec![json!(false), json!("abc")]);
    }

    #[test]
    fn casts_declared_uuid_columns_only() {
        let mut filter = Filter::new("notes").unwrap();
        filter.uuid_columns(["user_id"]).unwrap();
        filter
            .where_clause(json!({ "user_id": "abc", "category": "work" }))
            .unwrap();

        assert_eq!(
            filter.to_sql().unwrap().query,
            "SELECT * FROM \"notes\" WHERE \"category\" = $1 AND \"user_id\" = $2::uuid"
        );
        assert!(filter.uuid_columns(["bad column"]).is_err());
    }

    #[test]
    fn unfiltered_select() {
        let filter = Filter::new("notes").unwrap();
        assert_eq!(filter.to_sql().unwrap().query, "SELECT * FROM \"notes\" WHERE 1=1");
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("").is_err());
        assert!(Filter::new("notes; --").is_err());
        assert!(Filter::new("9notes").is_err());
    }
}
