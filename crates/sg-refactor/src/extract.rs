//! `extract_function` (spec.md §4.6).

use crate::error::RefactorError;
use crate::scope::{ScopeKind, ScopeTree};
use regex::Regex;
use sg_core::{CoreError, Language};
use sg_rewrite::{ApplyOptions, EditCause, FileDiff, FileEdit, RewriteEngine, RewritePlan};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub struct ExtractFunctionRequest {
    pub path: PathBuf,
    /// 1-indexed, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    pub new_name: String,
    pub language: Language,
    pub dry_run: bool,
}

pub enum ExtractOutcome {
    Applied {
        applied_paths: Vec<PathBuf>,
        backup_id: Option<String>,
    },
    Preview(Vec<FileDiff>),
}

fn identifier_regex() -> Regex {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap()
}

fn assignment_target_regex(language: Language) -> Regex {
    match language {
        Language::Python | Language::Rust | Language::Go => {
            Regex::new(r"^\s*(?:let\s+|var\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*(?::=|=)(?!=)").unwrap()
        }
        _ => Regex::new(r"^\s*(?:let\s+|var\s+|const\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=(?!=)").unwrap(),
    }
}

/// Pulls the parameter names out of the enclosing function's own header line
/// (e.g. `def compute(a, b):`), so they land in `bound_before` alongside
/// ordinary local assignments — without this, a selection that only reads
/// the enclosing function's own parameters would see them as neither bound
/// nor assignable and silently drop them from the extracted signature.
fn signature_parameters(header: &str, language: Language) -> Vec<String> {
    let Some(params) = parenthesized_span(header) else {
        return Vec::new();
    };
    let id_regex = identifier_regex();
    let skip: BTreeSet<&str> = ["mut", "pub", "self", "ref", "const", "let", "var", "final", "this"]
        .into_iter()
        .collect();

    params
        .split(',')
        .filter_map(|chunk| {
            let chunk = chunk.split('=').next().unwrap_or(chunk);
            let idents: Vec<&str> = id_regex
                .find_iter(chunk)
                .map(|m| m.as_str())
                .filter(|id| !skip.contains(id))
                .collect();
            match language {
                // Type-first declarations (`int a`) carry the name last.
                Language::Java | Language::C | Language::Cpp => idents.last().map(|s| s.to_string()),
                // Name-first declarations (`a: int`, `a int`, plain `a`).
                _ => idents.first().map(|s| s.to_string()),
            }
        })
        .collect()
}

fn parenthesized_span(line: &str) -> Option<&str> {
    let start = line.find('(')?;
    let end = line.rfind(')')?;
    if end <= start {
        return None;
    }
    Some(&line[start + 1..end])
}

fn reserved_identifiers(language: Language) -> BTreeSet<&'static str> {
    // Keywords plus a short list of builtins that should never be treated
    // as data-flow identifiers.
    let mut set: BTreeSet<&'static str> = BTreeSet::new();
    for kw in [
        "True", "False", "None", "self", "this", "nil", "null", "len", "range", "print",
    ] {
        set.insert(kw);
    }
    let words: &[&str] = match language {
        Language::Python => &[
            "def", "class", "return", "import", "from", "if", "else", "elif", "for", "while",
            "with", "as", "lambda", "yield", "global", "nonlocal", "and", "or", "not", "in",
        ],
        Language::JavaScript | Language::TypeScript => &[
            "function", "class", "return", "import", "export", "const", "let", "var", "if",
            "else", "for", "while", "new", "typeof",
        ],
        Language::Go => &[
            "func", "package", "import", "return", "if", "else", "for", "range", "var", "const",
            "type", "struct",
        ],
        Language::Rust => &[
            "fn", "let", "mut", "return", "use", "mod", "struct", "enum", "impl", "match", "if",
            "else", "for", "while", "loop",
        ],
        Language::Java => &[
            "class", "return", "import", "package", "if", "else", "for", "while", "public",
            "private", "static", "new",
        ],
        Language::C | Language::Cpp => &[
            "return", "if", "else", "for", "while", "struct", "static", "const", "void",
        ],
    };
    set.extend(words);
    set
}

/// Reasons a selection cannot be extracted without risking a change in
/// control flow (spec.md §4.6 edge cases).
fn reject_if_unsafe_selection(lines: &[&str], language: Language) -> Result<(), RefactorError> {
    if lines.is_empty() {
        return Err(RefactorError::InvalidSelection("empty selection".to_string()));
    }

    let first_indent = indent_width(lines[0]);
    for line in &lines[1..] {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) < first_indent {
            return Err(RefactorError::InvalidSelection(
                "selection dedents below its own starting indentation, suggesting it crosses a block boundary"
                    .to_string(),
            ));
        }
    }

    let has_loop_header = lines
        .iter()
        .any(|l| indent_width(l) <= first_indent && is_loop_header(l, language));

    for line in lines {
        let trimmed = line.trim_start();
        if (trimmed.starts_with("break") || trimmed.starts_with("continue")) && !has_loop_header {
            return Err(RefactorError::InvalidSelection(format!(
                "'{}' has no enclosing loop within the selection",
                trimmed.split_whitespace().next().unwrap_or("")
            )));
        }
    }

    Ok(())
}

fn is_loop_header(line: &str, language: Language) -> bool {
    let trimmed = line.trim_start();
    match language {
        Language::Python => trimmed.starts_with("for ") || trimmed.starts_with("while "),
        _ => trimmed.starts_with("for") || trimmed.starts_with("while"),
    }
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

struct FlowAnalysis {
    parameters: Vec<String>,
    returns: Vec<String>,
}

fn analyze_flow(
    before_lines: &[&str],
    selected_lines: &[&str],
    after_lines: &[&str],
    language: Language,
) -> FlowAnalysis {
    let id_regex = identifier_regex();
    let assign_regex = assignment_target_regex(language);
    let reserved = reserved_identifiers(language);

    let mut bound_before: BTreeSet<String> = before_lines
        .iter()
        .filter_map(|l| assign_regex.captures(l))
        .map(|c| c[1].to_string())
        .collect();
    for line in before_lines {
        bound_before.extend(signature_parameters(line, language));
    }

    let bound_inside: BTreeSet<String> = selected_lines
        .iter()
        .filter_map(|l| assign_regex.captures(l))
        .map(|c| c[1].to_string())
        .collect();

    let used_inside: BTreeSet<String> = selected_lines
        .iter()
        .flat_map(|l| id_regex.find_iter(l).map(|m| m.as_str().to_string()))
        .filter(|id| !reserved.contains(id.as_str()))
        .collect();

    let used_after: BTreeSet<String> = after_lines
        .iter()
        .flat_map(|l| id_regex.find_iter(l).map(|m| m.as_str().to_string()))
        .filter(|id| !reserved.contains(id.as_str()))
        .collect();

    let mut parameters: Vec<String> = used_inside
        .iter()
        .filter(|id| bound_before.contains(*id) && !bound_inside.contains(*id))
        .cloned()
        .collect();
    parameters.sort();

    let mut returns: Vec<String> = bound_inside
        .iter()
        .filter(|id| used_after.contains(*id))
        .cloned()
        .collect();
    returns.sort();

    FlowAnalysis { parameters, returns }
}

fn generate_function_definition(
    name: &str,
    flow: &FlowAnalysis,
    body_lines: &[&str],
    language: Language,
) -> String {
    let params = flow.parameters.join(", ");
    let dedented: Vec<String> = dedent(body_lines);

    match language {
        Language::Python => {
            let mut out = format!("def {name}({params}):\n");
            for line in &dedented {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            if !flow.returns.is_empty() {
                out.push_str(&format!("    return {}\n", flow.returns.join(", ")));
            }
            out
        }
        Language::JavaScript | Language::TypeScript => {
            let mut out = format!("function {name}({params}) {{\n");
            for line in &dedented {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
            if !flow.returns.is_empty() {
                if flow.returns.len() == 1 {
                    out.push_str(&format!("  return {};\n", flow.returns[0]));
                } else {
                    out.push_str(&format!("  return {{ {} }};\n", flow.returns.join(", ")));
                }
            }
            out.push_str("}\n");
            out
        }
        Language::Go => {
            let mut out = format!("func {name}({params}) {{\n");
            for line in &dedented {
                out.push_str("\t");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("}\n");
            out
        }
        Language::Rust => {
            let mut out = format!("fn {name}({params}) {{\n");
            for line in &dedented {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("}\n");
            out
        }
        _ => {
            let mut out = format!("{name}({params}) {{\n");
            for line in &dedented {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("}\n");
            out
        }
    }
}

fn dedent(lines: &[&str]) -> Vec<String> {
    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.len() >= min_indent {
                l[min_indent..].to_string()
            } else {
                l.to_string()
            }
        })
        .collect()
}

fn generate_call_expression(name: &str, flow: &FlowAnalysis, indent: &str, language: Language) -> String {
    let args = flow.parameters.join(", ");
    match language {
        Language::Python => match flow.returns.len() {
            0 => format!("{indent}{name}({args})\n"),
            _ => format!("{indent}{} = {name}({args})\n", flow.returns.join(", ")),
        },
        Language::JavaScript | Language::TypeScript => match flow.returns.len() {
            0 => format!("{indent}{name}({args});\n"),
            1 => format!("{indent}const {} = {name}({args});\n", flow.returns[0]),
            _ => format!(
                "{indent}const {{ {} }} = {name}({args});\n",
                flow.returns.join(", ")
            ),
        },
        _ => match flow.returns.len() {
            0 => format!("{indent}{name}({args});\n"),
            _ => format!("{indent}let {} = {name}({args});\n", flow.returns.join(", ")),
        },
    }
}

/// Extracts `[start_line, end_line]` of `path` into a new function
/// `new_name`, replacing the selection with a call.
pub fn extract_function(
    rewrite_engine: &RewriteEngine,
    request: &ExtractFunctionRequest,
) -> Result<ExtractOutcome, CoreError> {
    let source = std::fs::read_to_string(&request.path).map_err(RefactorError::from)?;
    let scope_tree = ScopeTree::build(&source, request.language);
    let all_lines: Vec<&str> = source.lines().collect();

    if request.start_line == 0
        || request.end_line < request.start_line
        || request.end_line > all_lines.len()
    {
        return Err(RefactorError::InvalidSelection(
            "selection is out of range".to_string(),
        )
        .into());
    }

    let enclosing_scope_id = scope_tree.innermost_containing(request.start_line);
    let enclosing_scope = scope_tree.scope(enclosing_scope_id);
    if enclosing_scope.kind == ScopeKind::Module
        || request.end_line > enclosing_scope.end_line
        || request.start_line < enclosing_scope.start_line
    {
        return Err(RefactorError::InvalidSelection(
            "selection is not contained within a single enclosing function".to_string(),
        )
        .into());
    }

    let selected_lines: Vec<&str> = all_lines[request.start_line - 1..request.end_line].to_vec();
    reject_if_unsafe_selection(&selected_lines, request.language)?;

    if selected_lines
        .iter()
        .any(|l| l.trim_start().starts_with("return") && request.end_line != enclosing_scope.end_line)
    {
        return Err(RefactorError::InvalidSelection(
            "selection contains a return that would escape the enclosing function".to_string(),
        )
        .into());
    }

    let before_lines: Vec<&str> = all_lines[enclosing_scope.start_line - 1..request.start_line - 1].to_vec();
    let after_lines: Vec<&str> =
        all_lines[request.end_line..enclosing_scope.end_line.min(all_lines.len())].to_vec();

    let flow = analyze_flow(&before_lines, &selected_lines, &after_lines, request.language);

    let new_function =
        generate_function_definition(&request.new_name, &flow, &selected_lines, request.language);
    let call_indent = " ".repeat(indent_width(selected_lines[0]));
    let call_expression =
        generate_call_expression(&request.new_name, &flow, &call_indent, request.language);

    let mut new_lines: Vec<String> = Vec::with_capacity(all_lines.len() + 10);
    new_lines.extend(all_lines[..request.start_line - 1].iter().map(|s| s.to_string()));
    new_lines.push(call_expression.trim_end_matches('\n').to_string());
    new_lines.extend(all_lines[request.end_line..].iter().map(|s| s.to_string()));

    // Place the new function immediately after the enclosing function
    // (spec.md §4.6 step 4: "adjacent to the enclosing function").
    let insertion_line = enclosing_scope.end_line.min(new_lines.len());
    new_lines.insert(insertion_line, String::new());
    for (offset, line) in new_function.trim_end_matches('\n').lines().enumerate() {
        new_lines.insert(insertion_line + 1 + offset, line.to_string());
    }

    let mut new_source = new_lines.join("\n");
    if source.ends_with('\n') {
        new_source.push('\n');
    }

    let edit = FileEdit {
        path: request.path.clone(),
        new_bytes: new_source.into_bytes(),
        cause: EditCause::SymbolRename {
            old: String::new(),
            new: request.new_name.clone(),
        },
    };
    let plan = RewritePlan::new(vec![edit]);

    if request.dry_run {
        return Ok(ExtractOutcome::Preview(rewrite_engine.preview(&plan)?));
    }

    let options = ApplyOptions {
        validate_syntax: true,
        make_backup: true,
        dry_run: false,
        language: request.language.name().to_string(),
    };
    let result = rewrite_engine.apply(&plan, &options)?;
    Ok(ExtractOutcome::Applied {
        applied_paths: result.applied_paths,
        backup_id: result.backup_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_analysis_identifies_parameters_and_returns() {
        let before = vec!["def compute(a, b):"];
        let selected = vec!["    total = a + b"];
        let after = vec!["    return total"];
        let flow = analyze_flow(&before, &selected, &after, Language::Python);
        assert!(flow.parameters.contains(&"a".to_string()));
        assert!(flow.parameters.contains(&"b".to_string()));
        assert!(flow.returns.contains(&"total".to_string()));
    }

    #[test]
    fn rejects_break_without_enclosing_loop_in_selection() {
        let selected = vec!["    break"];
        let result = reject_if_unsafe_selection(&selected, Language::Python);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_loop_body_containing_its_own_header() {
        let selected = vec!["    for x in range(10):", "        break"];
        let result = reject_if_unsafe_selection(&selected, Language::Python);
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_selection_that_dedents_below_its_start() {
        let selected = vec!["        total = a + b", "    return total"];
        let result = reject_if_unsafe_selection(&selected, Language::Python);
        assert!(result.is_err());
    }
}
