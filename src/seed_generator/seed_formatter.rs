use crate::seed_generator::{data_snapshotter::RowRecord, row_serializer::serialize_chunk};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Builds the `{{insert_statements}}` body: one insert call per chunk of at most `chunk_size`
/// rows, in row order. A chunk size of 0 falls back to [`DEFAULT_CHUNK_SIZE`].
pub fn build_inline_body(table: &str, rows: &[RowRecord], chunk_size: usize) -> String {
    let chunk_size = effective_chunk_size(chunk_size);

    rows.chunks(chunk_size)
        .map(|chunk| {
            format!(
                "\n\t\t\\DB::table('{}')->insert({});",
                table,
                serialize_chunk(chunk)
            )
        })
        .collect()
}

pub fn effective_chunk_size(chunk_size: usize) -> usize {
    match chunk_size {
        0 => DEFAULT_CHUNK_SIZE,
        size => size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_generator::data_snapshotter::ScalarValue;

    fn numbered_rows(count: usize) -> Vec<RowRecord> {
        (0..count)
            .map(|i| {
                RowRecord::new(vec![(
                    "id".to_string(),
                    ScalarValue::Number(i.to_string()),
                )])
            })
            .collect()
    }

    fn insert_lines(body: &str) -> Vec<&str> {
        body.lines()
            .filter(|line| line.starts_with("\t\t\\DB::table("))
            .collect()
    }

    #[test]
    fn one_insert_per_chunk() {
        for (rows, chunk_size, expected) in [(0, 3, 0), (1, 3, 1), (3, 3, 1), (7, 3, 3), (10, 1, 10)] {
            let body = build_inline_body("users", &numbered_rows(rows), chunk_size);
            assert_eq!(
                insert_lines(&body).len(),
                expected,
                "{} rows with a chunk size of {}",
                rows,
                chunk_size
            );
        }
    }

    #[test]
    fn rows_keep_their_order_across_chunks() {
        let body = build_inline_body("users", &numbered_rows(7), 3);

        let ids: Vec<&str> = body
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix("'id' => "))
            .map(|id| id.trim_end_matches(','))
            .collect();

        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn zero_rows_gives_an_empty_body() {
        assert_eq!(build_inline_body("users", &[], 10), "");
    }

    #[test]
    fn zero_chunk_size_uses_the_default() {
        assert_eq!(effective_chunk_size(0), DEFAULT_CHUNK_SIZE);
        assert_eq!(effective_chunk_size(7), 7);

        let body = build_inline_body("users", &numbered_rows(DEFAULT_CHUNK_SIZE + 1), 0);
        assert_eq!(insert_lines(&body).len(), 2);
    }

    #[test]
    fn insert_line_references_the_table() {
        let body = build_inline_body("user_roles", &numbered_rows(1), 10);

        assert!(body.starts_with("\n\t\t\\DB::table('user_roles')->insert(array (\n"));
        assert!(body.ends_with("\n\t\t));"));
    }
}
