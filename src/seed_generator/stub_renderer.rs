use std::path::Path;

pub const INLINE_STUB_FILE: &str = "seed.stub";
pub const DUMP_STUB_FILE: &str = "seed_dump.stub";

pub const DEFAULT_INLINE_STUB: &str = "<?php

class {{class}} extends Seeder {

    /**
     * Auto generated seed file
     *
     * @return void
     */
    public function run()
    {
        \\DB::table('{{table}}')->delete();
        {{insert_statements}}
    }

}
";

pub const DEFAULT_DUMP_STUB: &str = "<?php

class {{class}} extends Seeder {

    /**
     * Auto generated seed file, loads a compressed pg_dump of {{table}}
     *
     * @return void
     */
    public function run()
    {
        \\DB::table('{{table}}')->delete();

        $sql = gzdecode(file_get_contents(__DIR__ . '/dumps/{{sql_file}}'));

        // The dump empties search_path for the session, put it back for the seeders that follow
        $searchPath = \\DB::selectOne('SHOW search_path')->search_path;
        \\DB::unprepared($sql);
        \\DB::select(\"SELECT pg_catalog.set_config('search_path', ?, false)\", [$searchPath]);
    }

}
";

/// The pair of templates a seeder is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stubs {
    pub inline: String,
    pub dump: String,
}

impl Default for Stubs {
    fn default() -> Self {
        Self {
            inline: DEFAULT_INLINE_STUB.to_string(),
            dump: DEFAULT_DUMP_STUB.to_string(),
        }
    }
}

impl Stubs {
    /// Loads the stubs from `stub_dir`, falling back to the built in template for any file that
    /// does not exist there.
    pub fn load(stub_dir: Option<&Path>) -> std::io::Result<Self> {
        let mut stubs = Self::default();

        if let Some(stub_dir) = stub_dir {
            let inline_path = stub_dir.join(INLINE_STUB_FILE);
            if inline_path.exists() {
                stubs.inline = std::fs::read_to_string(inline_path)?;
            }

            let dump_path = stub_dir.join(DUMP_STUB_FILE);
            if dump_path.exists() {
                stubs.dump = std::fs::read_to_string(dump_path)?;
            }
        }

        Ok(stubs)
    }
}

/// Replaces each `placeholder` with its value. Placeholders not in `substitutions` stay as they
/// are.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |rendered, (placeholder, value)| {
            rendered.replace(placeholder, value)
        })
}

pub fn render_inline(template: &str, class: &str, table: &str, insert_statements: &str) -> String {
    render(
        template,
        &[
            ("{{class}}", class),
            ("{{table}}", table),
            ("{{insert_statements}}", insert_statements),
        ],
    )
}

pub fn render_dump(template: &str, class: &str, table: &str, sql_file: &str) -> String {
    render(
        template,
        &[
            ("{{class}}", class),
            ("{{table}}", table),
            ("{{sql_file}}", sql_file),
        ],
    )
}
