//! Language-specific test-file glob patterns (spec.md §4.10).

use sg_core::Language;

pub fn test_file_globs(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["**/test_*.py", "**/*_test.py", "**/tests/**/*.py"],
        Language::JavaScript => &[
            "**/*.test.js",
            "**/*.spec.js",
            "**/__tests__/**/*.js",
            "**/*.test.jsx",
            "**/*.spec.jsx",
        ],
        Language::TypeScript => &[
            "**/*.test.ts",
            "**/*.spec.ts",
            "**/__tests__/**/*.ts",
            "**/*.test.tsx",
            "**/*.spec.tsx",
        ],
        Language::Go => &["**/*_test.go"],
        Language::Rust => &["**/tests/**/*.rs", "**/*_test.rs"],
        Language::Java => &["**/*Test.java", "**/*Tests.java", "**/src/test/**/*.java"],
        Language::C => &["**/test_*.c", "**/*_test.c"],
        Language::Cpp => &["**/test_*.cpp", "**/*_test.cpp", "**/test_*.cc", "**/*_test.cc"],
    }
}
