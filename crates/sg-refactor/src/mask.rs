//! Marks which byte positions in a source file fall inside a comment or a
//! string literal, so reference-finding can exclude them by default
//! (spec.md §4.5: "Comments and string literals are excluded by default").
//!
//! This is a best-effort lexical scan, not a full tokenizer: it is enough to
//! keep obviously-commented-out or quoted occurrences of a symbol out of the
//! reference set without needing a language grammar.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    Code,
    Comment,
    StringLiteral,
}

/// `mask[line][col]` (both 0-indexed) says what kind of content occupies
/// that character.
pub struct SourceMask {
    pub lines: Vec<Vec<MaskKind>>,
}

impl SourceMask {
    pub fn kind_at(&self, line_1indexed: usize, col_1indexed: usize) -> MaskKind {
        let line_idx = line_1indexed.saturating_sub(1);
        let col_idx = col_1indexed.saturating_sub(1);
        self.lines
            .get(line_idx)
            .and_then(|l| l.get(col_idx).copied())
            .unwrap_or(MaskKind::Code)
    }

    pub fn build(source: &str, line_comment: &str, block_comment: Option<(&str, &str)>) -> Self {
        let mut lines = Vec::new();
        let mut in_block_comment = false;
        let mut triple_quote: Option<char> = None;

        for line in source.lines() {
            let chars: Vec<char> = line.chars().collect();
            let mut kinds = vec![MaskKind::Code; chars.len()];
            let mut i = 0;
            let mut in_string: Option<char> = None;

            while i < chars.len() {
                if let Some(quote) = triple_quote {
                    kinds[i] = MaskKind::StringLiteral;
                    if chars[i] == quote
                        && chars.get(i + 1) == Some(&quote)
                        && chars.get(i + 2) == Some(&quote)
                    {
                        kinds[i + 1] = MaskKind::StringLiteral;
                        kinds[i + 2] = MaskKind::StringLiteral;
                        i += 3;
                        triple_quote = None;
                        continue;
                    }
                    i += 1;
                    continue;
                }

                if in_block_comment {
                    kinds[i] = MaskKind::Comment;
                    if let Some((_, end)) = block_comment {
                        if line[byte_offset(&chars, i)..].starts_with(end) {
                            for j in 0..end.chars().count() {
                                if i + j < kinds.len() {
                                    kinds[i + j] = MaskKind::Comment;
                                }
                            }
                            i += end.chars().count();
                            in_block_comment = false;
                            continue;
                        }
                    }
                    i += 1;
                    continue;
                }

                if let Some(quote) = in_string {
                    kinds[i] = MaskKind::StringLiteral;
                    if chars[i] == '\\' {
                        if i + 1 < chars.len() {
                            kinds[i + 1] = MaskKind::StringLiteral;
                        }
                        i += 2;
                        continue;
                    }
                    if chars[i] == quote {
                        in_string = None;
                    }
                    i += 1;
                    continue;
                }

                // Triple-quote start (python-style).
                if (chars[i] == '"' || chars[i] == '\'')
                    && chars.get(i + 1) == Some(&chars[i])
                    && chars.get(i + 2) == Some(&chars[i])
                {
                    triple_quote = Some(chars[i]);
                    kinds[i] = MaskKind::StringLiteral;
                    kinds[i + 1] = MaskKind::StringLiteral;
                    kinds[i + 2] = MaskKind::StringLiteral;
                    i += 3;
                    continue;
                }

                if let Some((start, _)) = block_comment {
                    if line[byte_offset(&chars, i)..].starts_with(start) {
                        in_block_comment = true;
                        for j in 0..start.chars().count() {
                            if i + j < kinds.len() {
                                kinds[i + j] = MaskKind::Comment;
                            }
                        }
                        i += start.chars().count();
                        continue;
                    }
                }

                if !line_comment.is_empty() && line[byte_offset(&chars, i)..].starts_with(line_comment) {
                    for k in i..chars.len() {
                        kinds[k] = MaskKind::Comment;
                    }
                    break;
                }

                if chars[i] == '"' || chars[i] == '\'' || chars[i] == '`' {
                    in_string = Some(chars[i]);
                    kinds[i] = MaskKind::StringLiteral;
                    i += 1;
                    continue;
                }

                i += 1;
            }

            lines.push(kinds);
        }

        Self { lines }
    }
}

fn byte_offset(chars: &[char], char_index: usize) -> usize {
    chars[..char_index].iter().map(|c| c.len_utf8()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_line_comment_is_masked() {
        let source = "x = 1  # old_name is mentioned here\nold_name()\n";
        let mask = SourceMask::build(source, "#", None);
        // "old_name" inside the comment on line 1.
        let comment_col = source.lines().next().unwrap().find("old_name").unwrap() + 1;
        assert_eq!(mask.kind_at(1, comment_col), MaskKind::Comment);
        assert_eq!(mask.kind_at(2, 1), MaskKind::Code);
    }

    #[test]
    fn string_literal_is_masked() {
        let source = "msg = \"call old_name now\"\nold_name()\n";
        let mask = SourceMask::build(source, "#", None);
        let string_col = source.lines().next().unwrap().find("old_name").unwrap() + 1;
        assert_eq!(mask.kind_at(1, string_col), MaskKind::StringLiteral);
        assert_eq!(mask.kind_at(2, 1), MaskKind::Code);
    }

    #[test]
    fn c_style_block_comment_spans_lines() {
        let source = "/* old_name\n   still commented */\nold_name();\n";
        let mask = SourceMask::build(source, "//", Some(("/*", "*/")));
        assert_eq!(mask.kind_at(1, 4), MaskKind::Comment);
        assert_eq!(mask.kind_at(3, 1), MaskKind::Code);
    }
}
