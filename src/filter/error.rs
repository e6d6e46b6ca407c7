use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid ORDER clause: {0}")]
    InvalidOrder(String),

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),
}
