use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;

/// Read-only table access for the listing endpoints
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Every row, newest first. No pagination.
    pub async fn select_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY created_at DESC",
            quote_identifier(self.table_name)
        );
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
