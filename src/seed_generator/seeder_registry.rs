use std::path::{Path, PathBuf};

use tracing::debug;

use crate::seed_generator::error::RegistryError;

pub const REGISTRY_FILE: &str = "DatabaseSeeder.php";

pub const DEFAULT_DATABASE_SEEDER: &str = "<?php

class DatabaseSeeder extends Seeder {

    /**
     * Run the database seeds.
     *
     * @return void
     */
    public function run()
    {
        Eloquent::unguard();
    }

}
";

const RUN_METHOD_ANCHOR: &str = "function run(";

/// The run-list that decides which seeders `db:seed` executes.
pub struct SeederRegistry {
    path: PathBuf,
}

impl SeederRegistry {
    pub fn new(seed_dir: &Path) -> Self {
        Self {
            path: seed_dir.join(REGISTRY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a `$this->call('<class_name>');` line to the end of the run method unless the class
    /// is already called from it.
    pub fn register(&self, class_name: &str) -> Result<(), RegistryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })?;

        let updated = match add_call(&content, class_name) {
            Some(updated) => updated,
            None if is_registered(&content, class_name) => {
                debug!(class_name, "seeder already registered");
                return Ok(());
            }
            None => {
                return Err(RegistryError::Format {
                    path: self.path.clone(),
                })
            }
        };

        std::fs::write(&self.path, updated).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

pub fn is_registered(content: &str, class_name: &str) -> bool {
    content.contains(&format!("$this->call('{}')", class_name))
        || content.contains(&format!("$this->call(\"{}\")", class_name))
        || content.contains(&format!("$this->call({}::class)", class_name))
}

/// Returns the content with the call inserted, or None when the class is already registered or
/// there is no run method to put it in.
fn add_call(content: &str, class_name: &str) -> Option<String> {
    if is_registered(content, class_name) {
        return None;
    }

    let closing = find_run_body_end(content)?;
    let line_start = content[..closing].rfind('\n').map_or(0, |pos| pos + 1);
    let closing_indent = &content[line_start..closing];

    let mut updated = String::with_capacity(content.len() + class_name.len() + 32);

    if closing_indent.chars().all(|c| c == ' ' || c == '\t') {
        // The brace sits on its own line, the call goes on a new line above it
        let step = if closing_indent.contains('\t') || closing_indent.is_empty() {
            "\t"
        } else {
            "    "
        };
        updated.push_str(&content[..line_start]);
        updated.push_str(&format!(
            "{}{}$this->call('{}');\n",
            closing_indent, step, class_name
        ));
        updated.push_str(&content[line_start..]);
    } else {
        updated.push_str(&content[..closing]);
        updated.push_str(&format!("\t$this->call('{}');\n\t", class_name));
        updated.push_str(&content[closing..]);
    }

    Some(updated)
}

/// Byte offset of the `}` closing the body of the run method. The anchor and the braces are only
/// matched in code, never inside string literals or comments.
fn find_run_body_end(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let anchor = RUN_METHOD_ANCHOR.as_bytes();

    let mut in_run = false;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = literal_end(content, i) {
            i = end;
            continue;
        }

        if !in_run {
            if bytes[i..].starts_with(anchor) {
                in_run = true;
                i += anchor.len();
                continue;
            }
        } else {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    if depth == 0 {
                        // A closing brace before the body opened means the anchor was not a method
                        return None;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    None
}

/// When a string literal or comment starts at `i`, the offset just past it. Unterminated ones run
/// to the end of the content.
fn literal_end(content: &str, i: usize) -> Option<usize> {
    let bytes = content.as_bytes();

    match bytes[i] {
        quote @ (b'\'' | b'"') => {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != quote {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            Some((j + 1).min(bytes.len()))
        }
        b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
            content[i + 2..]
                .find("*/")
                .map_or(bytes.len(), |end| i + 2 + end + 2),
        ),
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(line_end(content, i)),
        b'#' => Some(line_end(content, i)),
        _ => None,
    }
}

fn line_end(content: &str, i: usize) -> usize {
    content[i..].find('\n').map_or(content.len(), |end| i + end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn registry_with(content: &str) -> (tempfile::TempDir, SeederRegistry) {
        let dir = tempdir().expect("Temporary Directory should not fail to be created");
        std::fs::write(dir.path().join(REGISTRY_FILE), content).unwrap();
        let registry = SeederRegistry::new(dir.path());
        (dir, registry)
    }

    #[test]
    fn register_inserts_before_the_end_of_run() {
        let (_dir, registry) = registry_with(DEFAULT_DATABASE_SEEDER);

        registry.register("UsersTableSeeder").unwrap();

        let content = std::fs::read_to_string(registry.path()).unwrap();
        assert!(content.contains(
            "        Eloquent::unguard();\n        $this->call('UsersTableSeeder');\n    }\n"
        ));
    }

    #[test]
    fn register_is_idempotent() {
        let (_dir, registry) = registry_with(DEFAULT_DATABASE_SEEDER);

        registry.register("UsersTableSeeder").unwrap();
        let once = std::fs::read_to_string(registry.path()).unwrap();
        registry.register("UsersTableSeeder").unwrap();
        let twice = std::fs::read_to_string(registry.path()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.matches("$this->call('UsersTableSeeder');").count(), 1);
    }

    #[test]
    fn register_appends_in_call_order() {
        let (_dir, registry) = registry_with(DEFAULT_DATABASE_SEEDER);

        registry.register("UsersTableSeeder").unwrap();
        registry.register("UserRolesTableSeeder").unwrap();

        let content = std::fs::read_to_string(registry.path()).unwrap();
        let users = content.find("$this->call('UsersTableSeeder');").unwrap();
        let roles = content.find("$this->call('UserRolesTableSeeder');").unwrap();
        assert!(users < roles);
    }

    #[test]
    fn content_outside_run_is_untouched() {
        let before = "<?php\n// {not a brace that matters}\nclass DatabaseSeeder extends Seeder {\n\n\tpublic function run()\n\t{\n\t\tif (true) {\n\t\t\techo '}';\n\t\t}\n\t}\n\n\tpublic function other()\n\t{\n\t\treturn 1;\n\t}\n\n}\n";
        let (_dir, registry) = registry_with(before);

        registry.register("UsersTableSeeder").unwrap();

        let after = std::fs::read_to_string(registry.path()).unwrap();
        let inserted = "\t\t$this->call('UsersTableSeeder');\n";
        let at = after.find(inserted).unwrap();

        assert_eq!(&after[..at], &before[..at]);
        assert_eq!(&after[at + inserted.len()..], &before[at..]);
        assert!(after[at + inserted.len()..].starts_with("\t}\n\n\tpublic function other()"));
    }

    #[test]
    fn brace_on_the_same_line_still_gets_the_call() {
        let (_dir, registry) = registry_with("<?php class DatabaseSeeder { public function run() { } }");

        registry.register("UsersTableSeeder").unwrap();

        let content = std::fs::read_to_string(registry.path()).unwrap();
        assert_eq!(
            content,
            "<?php class DatabaseSeeder { public function run() { \t$this->call('UsersTableSeeder');\n\t} }"
        );
    }

    #[test]
    fn existing_class_constant_calls_count_as_registered() {
        let content = "<?php class DatabaseSeeder { public function run()\n{\n    $this->call(UsersTableSeeder::class);\n} }";
        let (_dir, registry) = registry_with(content);

        registry.register("UsersTableSeeder").unwrap();

        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), content);
    }

    #[test]
    fn missing_run_method_is_a_format_error() {
        let (_dir, registry) = registry_with("<?php class DatabaseSeeder { }");

        assert!(matches!(
            registry.register("UsersTableSeeder"),
            Err(RegistryError::Format { .. })
        ));
    }

    #[test]
    fn unbalanced_run_method_is_a_format_error() {
        let (_dir, registry) = registry_with("<?php class DatabaseSeeder { public function run() { ");

        assert!(matches!(
            registry.register("UsersTableSeeder"),
            Err(RegistryError::Format { .. })
        ));
    }

    #[test]
    fn anchor_inside_a_comment_is_ignored() {
        let before = "<?php\n/** Seeders are listed in function run() below */\nclass DatabaseSeeder extends Seeder {\n    public function run()\n    {\n    }\n\n    public function other()\n    {\n    }\n}\n";
        let (_dir, registry) = registry_with(before);

        registry.register("UsersTableSeeder").unwrap();

        let content = std::fs::read_to_string(registry.path()).unwrap();
        assert!(content.contains(
            "    public function run()\n    {\n        $this->call('UsersTableSeeder');\n    }\n\n    public function other()"
        ));
    }

    #[test]
    fn anchor_only_in_comments_and_strings_is_a_format_error() {
        let (_dir, registry) = registry_with(
            "<?php\n// function run() { }\nclass DatabaseSeeder {\n    $name = 'function run() {}';\n}\n",
        );

        assert!(matches!(
            registry.register("UsersTableSeeder"),
            Err(RegistryError::Format { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_write_error() {
        let dir = tempdir().unwrap();
        let registry = SeederRegistry::new(dir.path());

        assert!(matches!(
            registry.register("UsersTableSeeder"),
            Err(RegistryError::Write { .. })
        ));
    }
}
