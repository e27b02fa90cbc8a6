//! The pluggable syntax-validation predicate (spec.md §4.4).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self { ok: false, errors }
    }
}

/// Language-specific syntax validation is owned by the caller; the rewrite
/// engine only invokes it between computing new bytes and writing them.
pub type SyntaxValidator = dyn Fn(&str, &[u8]) -> ValidationResult + Send + Sync;

/// A validator that accepts everything, for callers with no language-aware
/// checker wired up yet.
pub fn permissive_validator() -> Box<SyntaxValidator> {
    Box::new(|_language, _bytes| ValidationResult::ok())
}

/// A minimal balanced-delimiter check, useful as a cheap default and for
/// tests: rejects bytes with mismatched `()`, `[]`, `{}`.
pub fn balanced_delimiters_validator() -> Box<SyntaxValidator> {
    Box::new(|_language, bytes| {
        let text = String::from_utf8_lossy(bytes);
        let mut stack = Vec::new();
        for ch in text.chars() {
            match ch {
                '(' | '[' | '{' => stack.push(ch),
                ')' => {
                    if stack.pop() != Some('(') {
                        return ValidationResult::failed(vec!["unbalanced ')'".to_string()]);
                    }
                }
                ']' => {
                    if stack.pop() != Some('[') {
                        return ValidationResult::failed(vec!["unbalanced ']'".to_string()]);
                    }
                }
                '}' => {
                    if stack.pop() != Some('{') {
                        return ValidationResult::failed(vec!["unbalanced '}'".to_string()]);
                    }
                }
                _ => {}
            }
        }
        if stack.is_empty() {
            ValidationResult::ok()
        } else {
            ValidationResult::failed(vec!["unclosed delimiter".to_string()])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_text_passes() {
        let validator = balanced_delimiters_validator();
        assert!(validator("python", b"def f(x): return [x]").ok);
    }

    #[test]
    fn unbalanced_text_fails() {
        let validator = balanced_delimiters_validator();
        assert!(!validator("python", b"def f(x): return [x").ok);
    }
}
