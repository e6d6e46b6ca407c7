use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterData};
use crate::filter::types::SqlResult;

pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let filter = Filter::new(table_name).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            filter,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Columns whose parameters must be compared as `uuid` rather than text.
    pub fn uuid_columns(mut self, columns: &[&str]) -> Result<Self, DatabaseError> {
        self.filter
            .uuid_columns(columns.iter().copied())
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(self)
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter
            .assign(filter_data)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.to_sql()?;
        tracing::debug!(query = %sql_result.query, params = sql_result.params.len(), "select");

        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    /// The statement `select_all` would run, with its parameters in bind order.
    pub fn to_sql(&self) -> Result<SqlResult, DatabaseError> {
        self.filter
            .to_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }
}

fn bind_param<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        // Always text; uuid columns cast their placeholder in the SQL
        Value::String(s) => q.bind(s.as_str()),
        // Arrays are expanded by FilterWhere before binding
        Value::Array(_) => q,
        Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}
