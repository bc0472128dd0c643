//! Declaration-level chunking for source code.
//!
//! One chunk is emitted per top-level function, method, class, or
//! exported declaration, each prefixed with the file's leading
//! import/use block so the chunk is comprehensible in isolation.
//! Boundaries are found with per-language regexes rather than a real
//! grammar: a `GRAMMARS_DIR`-backed tree-sitter detector is an external
//! collaborator this crate does not ship.

use std::sync::OnceLock;

use regex::Regex;

use super::{Language, split_oversized};
use crate::error::Result;
use crate::types::Chunk;

struct Boundary {
    line: usize,
    symbol_type: &'static str,
    name: Option<String>,
}

fn boundary_regex(language: Language) -> &'static Regex {
    macro_rules! cached {
        ($cell:ident, $pat:expr) => {{
            static $cell: OnceLock<Regex> = OnceLock::new();
            #[allow(clippy::unwrap_used)]
            $cell.get_or_init(|| Regex::new($pat).unwrap())
        }};
    }

    match language {
        Language::Rust => cached!(
            RUST,
            r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(fn|struct|enum|trait|impl|mod)\s+([A-Za-z_][A-Za-z0-9_]*)"
        ),
        Language::Python => cached!(PY, r"(?m)^(?:async\s+)?(def|class)\s+([A-Za-z_][A-Za-z0-9_]*)"),
        Language::JavaScript => cached!(
            JS,
            r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:async\s+)?(function|class)\s+([A-Za-z_$][A-Za-z0-9_$]*)|^\s*(?:export\s+)?const\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s*)?\("
        ),
        Language::Go => cached!(
            GO,
            r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)|^type\s+([A-Za-z_][A-Za-z0-9_]*)\s+(?:struct|interface)"
        ),
        Language::Java => cached!(
            JAVA,
            r"(?m)^\s*(?:public|private|protected)?\s*(?:static\s+)?(?:final\s+)?(class|interface|enum)\s+([A-Za-z_][A-Za-z0-9_]*)"
        ),
        Language::C => cached!(
            C,
            r"(?m)^[A-Za-z_][A-Za-z0-9_ *]*\s+([A-Za-z_][A-Za-z0-9_]*)\s*\([^;{]*\)\s*\{"
        ),
        Language::Ruby => cached!(RUBY, r"(?m)^\s*(def|class|module)\s+([A-Za-z_][A-Za-z0-9_?!]*)"),
        Language::Php => cached!(
            PHP,
            r"(?m)^\s*(?:public|private|protected)?\s*(?:static\s+)?(function|class)\s+([A-Za-z_][A-Za-z0-9_]*)"
        ),
        Language::Prose => unreachable!("prose is handled by chunk::prose"),
    }
}

fn is_import_line(language: Language, line: &str) -> bool {
    let trimmed = line.trim_start();
    match language {
        Language::Rust => trimmed.starts_with("use ") || trimmed.starts_with("extern crate"),
        Language::Python => trimmed.starts_with("import ") || trimmed.starts_with("from "),
        Language::JavaScript => trimmed.starts_with("import ") || trimmed.starts_with("const ") && trimmed.contains("require("),
        Language::Go => trimmed.starts_with("import ") || trimmed == "import (" || trimmed.starts_with('"'),
        Language::Java => trimmed.starts_with("import ") || trimmed.starts_with("package "),
        Language::C => trimmed.starts_with("#include"),
        Language::Ruby => trimmed.starts_with("require ") || trimmed.starts_with("require_relative"),
        Language::Php => trimmed.starts_with("use ") || trimmed.starts_with("require") || trimmed.starts_with("<?php"),
        Language::Prose => false,
    }
}

fn find_boundaries(text: &str, language: Language) -> Vec<Boundary> {
    let re = boundary_regex(language);
    let mut line_offsets = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            line_offsets.push(i + 1);
        }
    }

    let mut boundaries = Vec::new();
    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let line = line_offsets.partition_point(|&off| off <= m.start());
        let name = caps
            .iter()
            .skip(1)
            .find_map(|g| g.map(|m| m.as_str().to_string()))
            .filter(|s| {
                !matches!(
                    s.as_str(),
                    "fn" | "struct" | "enum" | "trait" | "impl" | "mod" | "def" | "class"
                        | "function" | "interface" | "module"
                )
            });
        boundaries.push(Boundary {
            line: line.max(1) - 1,
            symbol_type: "declaration",
            name,
        });
    }
    boundaries
}

fn leading_import_block(lines: &[&str], language: Language) -> String {
    let mut preamble = Vec::new();
    for line in lines {
        if line.trim().is_empty() || is_import_line(language, line) {
            preamble.push(*line);
        } else {
            break;
        }
    }
    if preamble.is_empty() {
        String::new()
    } else {
        let mut s = preamble.join("\n");
        s.push('\n');
        s
    }
}

/// Chunks `text` (the contents of `path`) into one chunk per detected
/// top-level declaration, splitting any chunk over `max_chunk_size`
/// characters into overlapping sub-chunks.
pub fn chunk_code(
    path: &str,
    text: &str,
    language: Language,
    file_hash: &str,
    max_chunk_size: usize,
) -> Result<Vec<Chunk>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let lines: Vec<&str> = text.lines().collect();
    let boundaries = find_boundaries(text, language);
    let preamble = leading_import_block(&lines, language);
    let overlap = ((max_chunk_size as f64) * super::DEFAULT_OVERLAP_RATIO) as usize;

    let spans: Vec<(usize, usize, &'static str, Option<String>)> = if boundaries.is_empty() {
        vec![(0, lines.len().saturating_sub(1), "file", None)]
    } else {
        boundaries
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let end = boundaries
                    .get(i + 1)
                    .map_or(lines.len().saturating_sub(1), |next| next.line.saturating_sub(1));
                (b.line, end.max(b.line), b.symbol_type, b.name.clone())
            })
            .collect()
    };

    let mut chunks = Vec::new();
    for (start_line, end_line, symbol_type, name) in spans {
        let body = lines[start_line..=end_line.min(lines.len() - 1)].join("\n");
        let needs_preamble = !preamble.is_empty() && start_line > 0;
        let full_text = if needs_preamble {
            format!("{preamble}\n{body}")
        } else {
            body
        };
        let symbol_name = name.unwrap_or_else(|| "<anonymous>".to_string());

        let parts = split_oversized(&full_text, max_chunk_size, overlap.max(1));
        let multi = parts.len() > 1;
        for (idx, (part_text, _range)) in parts.into_iter().enumerate() {
            let part_symbol = if multi {
                format!("{symbol_name} (part {})", idx + 1)
            } else {
                symbol_name.clone()
            };
            let id = Chunk::make_id(file_hash, u32::try_from(start_line + 1).unwrap_or(u32::MAX), &part_symbol, chunks.len() as u32);
            chunks.push(Chunk {
                id,
                path: path.to_string(),
                language: language.as_str().to_string(),
                symbol_type: symbol_type.to_string(),
                symbol_name: part_symbol,
                start_line: u32::try_from(start_line + 1).unwrap_or(u32::MAX),
                end_line: u32::try_from(end_line + 1).unwrap_or(u32::MAX),
                file_hash: file_hash.to_string(),
                text: part_text,
            });
        }
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_code_emits_one_chunk_per_function() {
        let src = "use std::fmt;\n\nfn one() {\n    1\n}\n\nfn two() {\n    2\n}\n";
        let chunks = chunk_code("a.rs", src, Language::Rust, "hash1234", 2_000).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbol_name, "one");
        assert_eq!(chunks[1].symbol_name, "two");
    }

    #[test]
    fn chunk_code_prefixes_imports_on_non_first_chunks() {
        let src = "use std::fmt;\n\nfn one() {}\n\nfn two() {}\n";
        let chunks = chunk_code("a.rs", src, Language::Rust, "hash1234", 2_000).unwrap();
        assert!(chunks[1].text.contains("use std::fmt;"));
    }

    #[test]
    fn chunk_code_falls_back_to_whole_file_without_boundaries() {
        let src = "const X: i32 = 1;\nconst Y: i32 = 2;\n";
        let chunks = chunk_code("a.rs", src, Language::Rust, "hash1234", 2_000).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].symbol_type, "file");
    }

    #[test]
    fn chunk_code_empty_text_yields_no_chunks() {
        let chunks = chunk_code("a.rs", "   \n", Language::Rust, "hash1234", 2_000).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_code_splits_oversized_declarations() {
        let body = "x".repeat(5_000);
        let src = format!("fn big() {{\n{body}\n}}\n");
        let chunks = chunk_code("a.rs", &src, Language::Rust, "hash1234", 1_000).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks[1].symbol_name.contains("(part 2)"));
    }

    #[test]
    fn chunk_code_extracts_python_class_name() {
        let src = "class Widget:\n    def build(self):\n        pass\n";
        let chunks = chunk_code("a.py", src, Language::Python, "hash1234", 2_000).unwrap();
        assert_eq!(chunks[0].symbol_name, "Widget");
    }
}
