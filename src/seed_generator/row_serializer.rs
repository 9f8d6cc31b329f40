use crate::seed_generator::data_snapshotter::{RowRecord, ScalarValue};

/// Tabs in front of the row entries so they line up inside `\DB::table(..)->insert(`
pub const BASE_DEPTH: usize = 3;

/// Writes a chunk of rows as a PHP array literal in the layout `var_export` uses, re-indented
/// with tabs for the seeder body.
///
/// ```text
/// array (
/// \t\t\t0 =>
/// \t\t\tarray (
/// \t\t\t\t'id' => 1,
/// \t\t\t\t'name' => 'Homer',
/// \t\t\t),
/// \t\t)
/// ```
///
/// The first line is never indented since it follows the opening of the insert call. String
/// values are written byte for byte between their quotes, so a value spanning several lines
/// keeps its continuation lines untouched and brackets inside values never shift the depth.
pub fn serialize_chunk(rows: &[RowRecord]) -> String {
    let mut writer = LiteralWriter::new(BASE_DEPTH);

    writer.first_line("array (");
    for (index, row) in rows.iter().enumerate() {
        writer.line(&format!("{} => ", index));
        writer.open("array (");
        for (column, value) in row.columns() {
            writer.line(&format!("{} => {},", quote(column), literal(value)));
        }
        writer.close("),");
    }
    writer.close(")");

    writer.finish()
}

struct LiteralWriter {
    depth: usize,
    out: String,
}

impl LiteralWriter {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            out: String::new(),
        }
    }

    fn first_line(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn line(&mut self, text: &str) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push('\t');
        }
        self.out.push_str(text);
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn finish(self) -> String {
        self.out
    }
}

fn literal(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => String::from("NULL"),
        ScalarValue::Bool(true) => String::from("true"),
        ScalarValue::Bool(false) => String::from("false"),
        ScalarValue::Number(n) => n.clone(),
        ScalarValue::Text(s) => quote(s),
    }
}

/// Single quoted PHP string, only `\` and `'` need escaping.
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
