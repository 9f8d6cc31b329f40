use async_trait::async_trait;
use sqlx::{Executor, PgPool};
use tracing::debug;

/// Ordinary and partitioned tables only. Views, indexes and sequences resolve through
/// `to_regclass` too but cannot be seeded.
const TABLE_EXISTS_QUERY: &str = "SELECT EXISTS (
    SELECT 1 FROM pg_catalog.pg_class
    WHERE oid = to_regclass($1) AND relkind IN ('r', 'p')
)";

/// Answers the size questions the generator needs before it picks a strategy.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    async fn exists(&self, table: &str) -> Result<bool, sqlx::Error>;

    async fn row_count(&self, table: &str) -> Result<u64, sqlx::Error>;

    /// Number of columns a `SELECT *` over the table returns.
    async fn column_count(&self, table: &str) -> Result<u64, sqlx::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub row_count: u64,
    pub column_count: u64,
}

impl TableDescriptor {
    pub fn cell_count(&self) -> u64 {
        self.row_count.saturating_mul(self.column_count)
    }
}

pub struct PgSchemaInspector<'p> {
    pool: &'p PgPool,
}

impl<'p> PgSchemaInspector<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaInspector for PgSchemaInspector<'_> {
    async fn exists(&self, table: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(TABLE_EXISTS_QUERY)
            .bind(quote_table_name(table))
            .fetch_one(self.pool)
            .await
    }

    async fn row_count(&self, table: &str) -> Result<u64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_table_name(table)))
                .fetch_one(self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }

    async fn column_count(&self, table: &str) -> Result<u64, sqlx::Error> {
        // Probe the statement rather than the catalog so the count matches what a fetch returns
        let probe = format!("SELECT * FROM {} LIMIT 0", quote_table_name(table));
        let described = self.pool.describe(&probe).await?;
        debug!(table, columns = described.columns().len(), "described probe query");

        Ok(described.columns().len() as u64)
    }
}

/// Quotes every dot separated part of a (possibly schema qualified) table name.
pub fn quote_table_name(table: &str) -> String {
    table
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<String>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_table_name_works() {
        assert_eq!(quote_table_name("users"), "\"users\"");
        assert_eq!(quote_table_name("public.user_roles"), "\"public\".\"user_roles\"");
        assert_eq!(quote_table_name("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn exists_only_matches_tables() {
        assert!(TABLE_EXISTS_QUERY.contains("to_regclass($1)"));
        assert!(TABLE_EXISTS_QUERY.contains("relkind IN ('r', 'p')"));
    }

    #[test]
    fn cell_count_multiplies_rows_and_columns() {
        let table = TableDescriptor {
            name: "users".to_string(),
            row_count: 400,
            column_count: 5,
        };
        assert_eq!(table.cell_count(), 2000);

        let huge = TableDescriptor {
            name: "events".to_string(),
            row_count: u64::MAX,
            column_count: 2,
        };
        assert_eq!(huge.cell_count(), u64::MAX);
    }
}
