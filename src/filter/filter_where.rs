use std::collections::HashSet;

use serde_json::Value;

use super::error::FilterError;
use super::is_valid_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Turns a JSON where-object (`{ column: value }` or `{ column: { "$op": value } }`)
/// into a parameterised SQL condition. All conditions are ANDed.
///
/// Parameters are bound as text. Placeholders compared against a column listed
/// in `uuid_columns` carry an explicit `::uuid` cast; every other column is
/// compared as text no matter what the value looks like.
pub struct FilterWhere<'a> {
    uuid_columns: &'a HashSet<String>,
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl<'a> FilterWhere<'a> {
    pub fn new(starting_param_index: usize, uuid_columns: &'a HashSet<String>) -> Self {
        Self {
            uuid_columns,
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        uuid_columns: &HashSet<String>,
    ) -> Result<(String, Vec<Value>), FilterError> {
        FilterWhere::new(starting_param_index, uuid_columns).build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions = std::mem::take(&mut self.conditions);
        for condition in &conditions {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if !is_valid_identifier(key) {
                        return Err(FilterError::InvalidColumn(key.clone()));
                    }
                    self.parse_field_condition(key, value)?;
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$any" => FilterOp::Any,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = condition.column.as_str();
        let quoted_column = format!("\"{}\"", column);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { Ok(format!("{} IS NULL", quoted_column)) }
                else {
                    let placeholder = self.param(column, condition.data.clone());
                    Ok(format!("{} = {}", quoted_column, placeholder))
                }
            }
            // Array overlap: at least one element in common
            FilterOp::Any => {
                let values = Self::expect_scalars(&condition.data, "$any")?;
                if values.is_empty() { return Ok("1=0".to_string()); }
                let params: Vec<String> = values.into_iter().map(|v| self.param(column, v)).collect();
                Ok(format!("{} && ARRAY[{}]", quoted_column, params.join(", ")))
            }
        }
    }

    /// Operator data may be one scalar or an array of scalars.
    fn expect_scalars(data: &Value, op: &str) -> Result<Vec<Value>, FilterError> {
        let values = match data {
            Value::Array(values) => values.clone(),
            other => vec![other.clone()],
        };
        if values.iter().any(|v| v.is_array() || v.is_object()) {
            return Err(FilterError::InvalidOperatorData(format!("{} requires scalar values", op)));
        }
        Ok(values)
    }

    fn param(&mut self, column: &str, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        if self.uuid_columns.contains(column) {
            format!("${}::uuid", self.param_index)
        } else {
            format!("${}", self.param_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_uuid_columns() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn implicit_equality_and_overlap() {
        let (sql, params) = FilterWhere::generate(
            &json!({ "user_id": "u1", "tags": { "$any": ["x", "y"] } }),
            0,
            &no_uuid_columns(),
        )
        .unwrap();

        // serde_json objects iterate in key order
        assert_eq!(sql, "\"tags\" && ARRAY[$1, $2] AND \"user_id\" = $3");
        assert_eq!(params, vec![json!("x"), json!("y"), json!("u1")]);
    }

    #[test]
    fn only_uuid_columns_get_a_cast() {
        let uuid_like = "7b0c1f3e-8d5a-4a4b-9a55-2f0d6c1e9b11";
        let uuid_columns: HashSet<String> = ["user_id".to_string()].into_iter().collect();

        let (sql, params) = FilterWhere::generate(
            &json!({
                "user_id": uuid_like,
                "category": uuid_like,
                "tags": { "$any": [uuid_like, "x"] }
            }),
            0,
            &uuid_columns,
        )
        .unwrap();

        assert_eq!(
            sql,
            "\"category\" = $1 AND \"tags\" && ARRAY[$2, $3] AND \"user_id\" = $4::uuid"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn empty_overlap_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "tags": { "$any": [] } }), 0, &no_uuid_columns()).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_and_param_offset() {
        let (sql, params) = FilterWhere::generate(
            &json!({ "category": { "$eq": null }, "is_pinned": true }),
            2,
            &no_uuid_columns(),
        )
        .unwrap();
        assert_eq!(sql, "\"category\" IS NULL AND \"is_pinned\" = $3");
        assert_eq!(params, vec![json!(true)]);
    }

    #[test]
    fn rejects_bad_columns_and_operators() {
        let none = no_uuid_columns();
        assert!(matches!(
            FilterWhere::generate(&json!({ "title\"; DROP TABLE notes; --": "x" }), 0, &none),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "title": { "$regex": ".*" } }), 0, &none),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "tags": { "$ne": "x" } }), 0, &none),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "tags": { "$any": [["nested"]] } }), 0, &none),
            Err(FilterError::InvalidOperatorData(_))
        ));
        assert!(FilterWhere::validate(&json!("raw sql")).is_err());
    }
}
