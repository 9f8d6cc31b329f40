use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::PgPool;

use crate::seed_generator::table_inspector::quote_table_name;

/// A single cell as it will be written into the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    /// Kept as text so numerics never lose precision
    Number(String),
    Text(String),
}

impl From<Value> for ScalarValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.to_string()),
            Value::String(s) => Self::Text(s),
            // json/jsonb columns, arrays and composites are seeded as their json text
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Text(nested.to_string()),
        }
    }
}

/// One table row, columns in table order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowRecord {
    columns: Vec<(String, ScalarValue)>,
}

impl RowRecord {
    pub fn new(columns: Vec<(String, ScalarValue)>) -> Self {
        Self { columns }
    }

    /// Parses the output of `row_to_json`, keeping the key order of the object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, Value> = serde_json::from_str(json)?;

        Ok(Self {
            columns: object
                .into_iter()
                .map(|(column, value)| (column, ScalarValue::from(value)))
                .collect(),
        })
    }

    pub fn columns(&self) -> &[(String, ScalarValue)] {
        &self.columns
    }
}

/// Source of the complete contents of a table.
///
/// The rows come back in whatever order the database hands them out. No ORDER BY is applied so
/// two runs against the same table can produce differently ordered seeds unless the table itself
/// guarantees an order.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_all(&self, table: &str) -> Result<Vec<RowRecord>, sqlx::Error>;
}

pub struct PgRowSource<'p> {
    pool: &'p PgPool,
}

impl<'p> PgRowSource<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RowSource for PgRowSource<'_> {
    async fn fetch_all(&self, table: &str) -> Result<Vec<RowRecord>, sqlx::Error> {
        let query = format!(
            "SELECT row_to_json(t)::text FROM {} t",
            quote_table_name(table)
        );

        let mut rows = sqlx::query_scalar::<_, String>(&query).fetch(self.pool);
        let mut records = Vec::new();

        while let Some(json) = rows.try_next().await? {
            let record =
                RowRecord::from_json(&json).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_keeps_column_order() {
        let record = RowRecord::from_json(r#"{"zeta": 1, "alpha": "a", "mid": null}"#).unwrap();

        let names: Vec<&str> = record.columns().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn from_json_maps_values_to_scalars() {
        let record = RowRecord::from_json(
            r#"{"id": 12, "price": 10.50, "active": true, "note": null, "payload": {"a": [1, 2]}, "tags": ["x"], "blob": "\\xdeadbeef"}"#,
        )
        .unwrap();

        assert_eq!(
            record.columns(),
            &[
                ("id".to_string(), ScalarValue::Number("12".to_string())),
                ("price".to_string(), ScalarValue::Number("10.50".to_string())),
                ("active".to_string(), ScalarValue::Bool(true)),
                ("note".to_string(), ScalarValue::Null),
                ("payload".to_string(), ScalarValue::Text(r#"{"a":[1,2]}"#.to_string())),
                ("tags".to_string(), ScalarValue::Text(r#"["x"]"#.to_string())),
                ("blob".to_string(), ScalarValue::Text("\\xdeadbeef".to_string())),
            ]
        );
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(RowRecord::from_json("[1, 2, 3]").is_err());
    }
}
