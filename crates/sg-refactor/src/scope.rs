//! Per-file scope trees (spec.md §3 "Scope tree", §4.5 step 2).
//!
//! Built by scanning structural anchors — module top, class, function,
//! block — the same way the teacher's `ScopeManager` walks a scope stack,
//! except the anchors here are found with language-specific regexes over
//! source text rather than a pre-built AST, since the core never parses
//! source itself (that's the external matcher's job).

use regex::Regex;
use sg_core::Language;
use std::collections::HashSet;

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Block,
}

impl ScopeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScopeKind::Module => "module",
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent_id: Option<ScopeId>,
    pub kind: ScopeKind,
    pub name: String,
    /// 1-indexed, inclusive line range.
    pub start_line: usize,
    pub end_line: usize,
    pub introduced_names: HashSet<String>,
}

/// A rooted tree of scopes for one file. Scope 0 is always the module
/// scope spanning the whole file.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    pub scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn root_id() -> ScopeId {
        0
    }

    /// The innermost (deepest) scope containing `line`, used to attribute a
    /// reference to its enclosing scope.
    pub fn innermost_containing(&self, line: usize) -> ScopeId {
        self.scopes
            .iter()
            .filter(|s| s.start_line <= line && line <= s.end_line)
            .max_by_key(|s| s.start_line)
            .map(|s| s.id)
            .unwrap_or(Self::root_id())
    }

    /// The scope-path tuple from module outward to the given scope
    /// (spec.md §3 "Symbol reference ... enclosing scope path").
    pub fn path_to(&self, scope_id: ScopeId) -> Vec<(ScopeKind, String)> {
        let mut path = Vec::new();
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            path.push((scope.kind, scope.name.clone()));
            current = scope.parent_id;
        }
        path.reverse();
        path
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn ancestors(&self, scope_id: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut current = Some(scope_id);
        while let Some(id) = current {
            out.push(id);
            current = self.scopes[id].parent_id;
        }
        out
    }

    /// Builds a scope tree for `source`, the way Python (indentation-based)
    /// or a brace language (brace-depth-based) delimits nested scopes.
    pub fn build(source: &str, language: Language) -> Self {
        if matches!(language, Language::Python) {
            build_indentation_scopes(source)
        } else {
            build_brace_scopes(source, language)
        }
    }
}

fn def_class_regex_python() -> Regex {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<keyword>def|class)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)")
        .unwrap()
}

fn build_indentation_scopes(source: &str) -> ScopeTree {
    let anchor = def_class_regex_python();
    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len().max(1);

    let mut scopes = vec![Scope {
        id: 0,
        parent_id: None,
        kind: ScopeKind::Module,
        name: "<module>".to_string(),
        start_line: 1,
        end_line: total_lines,
        introduced_names: HashSet::new(),
    }];

    // Stack of (scope_id, indent_width).
    let mut stack: Vec<(ScopeId, usize)> = vec![(0, 0)];

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let indent_width = line.len() - line.trim_start().len();

        while stack.len() > 1 && indent_width <= stack.last().unwrap().1 {
            let (closed_id, _) = stack.pop().unwrap();
            scopes[closed_id].end_line = line_no - 1;
        }

        if let Some(caps) = anchor.captures(line) {
            let kind = if &caps["keyword"] == "class" {
                ScopeKind::Class
            } else {
                ScopeKind::Function
            };
            let name = caps["name"].to_string();
            let parent = stack.last().unwrap().0;
            let new_id = scopes.len();
            scopes.push(Scope {
                id: new_id,
                parent_id: Some(parent),
                kind,
                name: name.clone(),
                start_line: line_no,
                end_line: total_lines,
                introduced_names: HashSet::new(),
            });
            scopes[parent].introduced_names.insert(name);
            stack.push((new_id, indent_width));
        }
    }

    while let Some((closed_id, _)) = stack.pop() {
        if closed_id != 0 {
            scopes[closed_id].end_line = total_lines;
        }
    }

    ScopeTree { scopes }
}

fn def_anchor_regex(language: Language) -> Regex {
    match language {
        Language::JavaScript | Language::TypeScript => Regex::new(
            r"(?:^|\s)(?:function\s+(?P<fname>[A-Za-z_$][A-Za-z0-9_$]*)|class\s+(?P<cname>[A-Za-z_$][A-Za-z0-9_$]*))",
        )
        .unwrap(),
        Language::Go => Regex::new(r"^func\s+(?:\([^)]*\)\s*)?(?P<fname>[A-Za-z_][A-Za-z0-9_]*)").unwrap(),
        Language::Rust => Regex::new(
            r"^\s*(?:pub\s+)?(?:fn\s+(?P<fname>[A-Za-z_][A-Za-z0-9_]*)|(?:struct|enum|trait|impl)\s+(?P<cname>[A-Za-z_][A-Za-z0-9_]*))",
        )
        .unwrap(),
        Language::Java => Regex::new(
            r"^\s*(?:public|private|protected|static|\s)*\s*(?:class|interface)\s+(?P<cname>[A-Za-z_][A-Za-z0-9_]*)|[A-Za-z_<>\[\]]+\s+(?P<fname>[A-Za-z_][A-Za-z0-9_]*)\s*\([^;]*\)\s*\{",
        )
        .unwrap(),
        _ => Regex::new(
            r"^\s*(?:[A-Za-z_][A-Za-z0-9_:<>\*\s]*?)\s+(?P<fname>[A-Za-z_][A-Za-z0-9_]*)\s*\([^;]*\)\s*\{",
        )
        .unwrap(),
    }
}

fn build_brace_scopes(source: &str, language: Language) -> ScopeTree {
    let anchor = def_anchor_regex(language);
    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len().max(1);

    let mut scopes = vec![Scope {
        id: 0,
        parent_id: None,
        kind: ScopeKind::Module,
        name: "<module>".to_string(),
        start_line: 1,
        end_line: total_lines,
        introduced_names: HashSet::new(),
    }];

    // (scope_id, brace_depth_at_open)
    let mut stack: Vec<(ScopeId, i32)> = vec![(0, 0)];
    let mut depth: i32 = 0;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;

        if let Some(caps) = anchor.captures(line) {
            let (kind, name) = if let Some(m) = caps.name("cname") {
                (ScopeKind::Class, m.as_str().to_string())
            } else if let Some(m) = caps.name("fname") {
                (ScopeKind::Function, m.as_str().to_string())
            } else {
                (ScopeKind::Block, "<anonymous>".to_string())
            };
            let parent = stack.last().unwrap().0;
            let new_id = scopes.len();
            scopes.push(Scope {
                id: new_id,
                parent_id: Some(parent),
                kind,
                name: name.clone(),
                start_line: line_no,
                end_line: total_lines,
                introduced_names: HashSet::new(),
            });
            scopes[parent].introduced_names.insert(name);
            stack.push((new_id, depth));
        }

        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if stack.len() > 1 && depth <= stack.last().unwrap().1 {
                        let (closed_id, _) = stack.pop().unwrap();
                        scopes[closed_id].end_line = line_no;
                    }
                }
                _ => {}
            }
        }
    }

    while let Some((closed_id, _)) = stack.pop() {
        if closed_id != 0 {
            scopes[closed_id].end_line = total_lines;
        }
    }

    ScopeTree { scopes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_nested_function_gets_its_own_scope() {
        let source = "def outer():\n    x = 1\n    def inner():\n        y = 2\n    return x\n";
        let tree = ScopeTree::build(source, Language::Python);
        assert_eq!(tree.scopes.len(), 3); // module, outer, inner
        let inner_scope_id = tree.innermost_containing(4);
        assert_eq!(tree.scope(inner_scope_id).name, "inner");
        let outer_scope_id = tree.innermost_containing(5);
        assert_eq!(tree.scope(outer_scope_id).name, "outer");
    }

    #[test]
    fn js_function_scope_closes_on_matching_brace() {
        let source = "function outer() {\n  let x = 1;\n}\nfunction other() {\n  let y = 2;\n}\n";
        let tree = ScopeTree::build(source, Language::JavaScript);
        let first = tree.innermost_containing(2);
        assert_eq!(tree.scope(first).name, "outer");
        let second = tree.innermost_containing(5);
        assert_eq!(tree.scope(second).name, "other");
    }

    #[test]
    fn scope_path_runs_from_module_outward() {
        let source = "def outer():\n    def inner():\n        pass\n";
        let tree = ScopeTree::build(source, Language::Python);
        let inner_id = tree.innermost_containing(3);
        let path = tree.path_to(inner_id);
        assert_eq!(path[0].1, "<module>");
        assert_eq!(path.last().unwrap().1, "inner");
    }
}
