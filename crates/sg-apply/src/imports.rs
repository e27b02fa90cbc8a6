//! Import-block management (spec.md §4.11: "insert its import in the
//! language's canonical import block if not already present").

fn import_prefix(language: &str) -> &'static str {
    match language {
        "python" => "import ",
        "go" => "import ",
        "rust" => "use ",
        "java" => "import ",
        _ => "import ",
    }
}

/// Inserts each of `imports` into `source`'s import block unless an
/// identical line is already present. New imports land after the last
/// existing import line, or at the top of the file if there is none.
pub fn ensure_imports(source: &str, language: &str, imports: &[String]) -> String {
    if imports.is_empty() {
        return source.to_string();
    }
    let prefix = import_prefix(language);
    let lines: Vec<&str> = source.lines().collect();

    let missing: Vec<&String> = imports
        .iter()
        .filter(|imp| !lines.iter().any(|l| l.trim() == imp.trim()))
        .collect();
    if missing.is_empty() {
        return source.to_string();
    }

    let last_import_idx = lines
        .iter()
        .rposition(|l| l.trim_start().starts_with(prefix));

    let mut out_lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    let insert_at = last_import_idx.map(|i| i + 1).unwrap_or(0);
    for (offset, imp) in missing.iter().enumerate() {
        out_lines.insert(insert_at + offset, (*imp).clone());
    }

    let mut result = out_lines.join("\n");
    if source.ends_with('\n') {
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_import_is_inserted_after_existing_block() {
        let source = "import os\nimport sys\n\nprint('hi')\n";
        let result = ensure_imports(source, "python", &["import helpers".to_string()]);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[2], "import helpers");
    }

    #[test]
    fn existing_import_is_not_duplicated() {
        let source = "import os\n\nprint('hi')\n";
        let result = ensure_imports(source, "python", &["import os".to_string()]);
        assert_eq!(result.matches("import os").count(), 1);
    }

    #[test]
    fn import_is_prepended_when_no_existing_block() {
        let source = "print('hi')\n";
        let result = ensure_imports(source, "python", &["import helpers".to_string()]);
        assert!(result.starts_with("import helpers"));
    }
}
