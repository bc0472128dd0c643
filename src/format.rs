//! Rendering retrieved chunks for display: a compact, round-trippable
//! tabular format and a human-readable markdown format.

use crate::types::ContextChunk;

/// Code bodies longer than this many lines are truncated in the
/// compact format, with a sentinel line noting how much was cut.
const MAX_CODE_LINES: usize = 50;

/// One row of the compact tabular format: `[file, lines, relevance, code]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactRow {
    /// File path.
    pub file: String,
    /// 1-indexed inclusive start line.
    pub start_line: u32,
    /// 1-indexed inclusive end line.
    pub end_line: u32,
    /// Relevance as an integer percent, `round(score * 100)`.
    pub relevance: i64,
    /// The chunk's code/text.
    pub code: String,
}

impl From<&ContextChunk> for CompactRow {
    fn from(c: &ContextChunk) -> Self {
        Self {
            file: c.chunk.path.clone(),
            start_line: c.chunk.start_line,
            end_line: c.chunk.end_line,
            relevance: (c.relevance * 100.0).round() as i64,
            code: c.chunk.text.clone(),
        }
    }
}

/// Escapes `\`, `,`, and newline in a string field of the header line so
/// it can't be confused with the `, ` field delimiter or the newline
/// that ends the line: `\` becomes `\\`, a literal newline becomes `\n`,
/// and `,` becomes `\c` rather than `\,` — a bare comma must never
/// appear in the escaped output, or it would recreate the `, ` delimiter
/// together with whatever character originally followed it (e.g. the
/// space in "foo, bar.rs"). [`unescape_field`] reverses this.
fn escape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\c"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses [`escape_field`].
fn unescape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('c') => out.push(','),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encodes `rows` as a comma-delimited header followed by one
/// `file, lines, relevance` line per row with its code indented two
/// spaces beneath it. `file` is escaped with [`escape_field`] so a path
/// containing `,` or a newline still round-trips. Code over
/// [`MAX_CODE_LINES`] lines is truncated with a `... (N more lines)`
/// sentinel; rows at or under the limit round-trip exactly through
/// [`decode_compact`].
#[must_use]
pub fn encode_compact(rows: &[CompactRow]) -> String {
    let mut out = String::from("file, lines, relevance, code\n");
    for row in rows {
        out.push_str(&format!("{}, {}-{}, {}\n", escape_field(&row.file), row.start_line, row.end_line, row.relevance));
        let lines: Vec<&str> = row.code.lines().collect();
        let shown = lines.iter().take(MAX_CODE_LINES);
        for line in shown {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        if lines.len() > MAX_CODE_LINES {
            out.push_str(&format!("  ... ({} more lines)\n", lines.len() - MAX_CODE_LINES));
        }
    }
    out
}

fn parse_header_line(line: &str) -> Option<(String, u32, u32, i64)> {
    let parts: Vec<&str> = line.splitn(3, ", ").collect();
    if parts.len() != 3 {
        return None;
    }
    let (start, end) = parts[1].split_once('-')?;
    Some((unescape_field(parts[0]), start.parse().ok()?, end.parse().ok()?, parts[2].parse().ok()?))
}

/// Decodes output produced by [`encode_compact`] back into rows.
/// `decode_compact(&encode_compact(rows)) == rows` holds for any input
/// whose code bodies are all at or under [`MAX_CODE_LINES`] lines.
#[must_use]
pub fn decode_compact(text: &str) -> Vec<CompactRow> {
    let mut rows = Vec::new();
    let mut lines = text.lines();
    lines.next(); // header

    let mut current: Option<(String, u32, u32, i64, Vec<String>)> = None;
    for line in lines {
        if let Some(code_line) = line.strip_prefix("  ") {
            if let Some((_, _, _, _, code)) = current.as_mut() {
                code.push(code_line.to_string());
            }
        } else if let Some((file, start, end, relevance)) = parse_header_line(line) {
            if let Some((file, start, end, relevance, code)) = current.take() {
                rows.push(CompactRow { file, start_line: start, end_line: end, relevance, code: code.join("\n") });
            }
            current = Some((file, start, end, relevance, Vec::new()));
        }
    }
    if let Some((file, start, end, relevance, code)) = current {
        rows.push(CompactRow { file, start_line: start, end_line: end, relevance, code: code.join("\n") });
    }
    rows
}

/// Renders `rows` as human-readable markdown: one `### path:start-end`
/// section per row with a fenced code block and, when `show_relevance`,
/// a trailing `*Relevance: P%*` line.
#[must_use]
pub fn format_markdown(rows: &[CompactRow], show_relevance: bool) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!("### {}:{}-{}\n\n", row.file, row.start_line, row.end_line));
        out.push_str("```\n");
        out.push_str(&row.code);
        if !row.code.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
        if show_relevance {
            out.push_str(&format!("*Relevance: {}%*\n", row.relevance));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, start: u32, end: u32, relevance: i64, code: &str) -> CompactRow {
        CompactRow { file: file.to_string(), start_line: start, end_line: end, relevance, code: code.to_string() }
    }

    #[test]
    fn round_trip_holds_for_short_code() {
        let rows = vec![row("a.rs", 1, 3, 88, "fn f() {\n    1\n}"), row("b.rs", 10, 12, 50, "let x = 1;")];
        let encoded = encode_compact(&rows);
        let decoded = decode_compact(&encoded);
        assert_eq!(rows, decoded);
    }

    #[test]
    fn encoding_has_expected_header() {
        let encoded = encode_compact(&[]);
        assert_eq!(encoded, "file, lines, relevance, code\n");
    }

    #[test]
    fn long_code_is_truncated_with_sentinel() {
        let code = (0..60).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let encoded = encode_compact(&[row("a.rs", 1, 60, 100, &code)]);
        assert!(encoded.contains("... (10 more lines)"));
    }

    #[test]
    fn markdown_includes_relevance_when_requested() {
        let rendered = format_markdown(&[row("a.rs", 1, 2, 42, "x")], true);
        assert!(rendered.contains("### a.rs:1-2"));
        assert!(rendered.contains("*Relevance: 42%*"));
    }

    #[test]
    fn markdown_omits_relevance_when_not_requested() {
        let rendered = format_markdown(&[row("a.rs", 1, 2, 42, "x")], false);
        assert!(!rendered.contains("Relevance"));
    }

    #[test]
    fn relevance_is_rounded_to_nearest_percent() {
        let chunk = crate::types::ContextChunk {
            chunk: crate::types::Chunk {
                id: "c1".into(),
                path: "a.rs".into(),
                language: "rust".into(),
                symbol_type: "function".into(),
                symbol_name: "f".into(),
                start_line: 1,
                end_line: 1,
                file_hash: "hash".into(),
                text: String::new(),
            },
            relevance: 0.876,
        };
        let row: CompactRow = (&chunk).into();
        assert_eq!(row.relevance, 88);
    }

    #[test]
    fn a_file_path_containing_a_comma_round_trips() {
        let rows = vec![row("src/weird, name.rs", 1, 2, 75, "let x = 1;")];
        let encoded = encode_compact(&rows);
        let decoded = decode_compact(&encoded);
        assert_eq!(rows, decoded);
    }

    #[test]
    fn escaped_comma_never_reintroduces_the_field_delimiter() {
        // A bare "," in the escaped output would recreate the ", " field
        // delimiter together with whatever followed it in the original
        // field, corrupting the header split.
        assert!(!escape_field("weird, name.rs").contains(','));
    }

    #[test]
    fn escape_and_unescape_field_round_trip_backslashes_and_newlines() {
        let original = "weird\\path, with\ncomma and newline";
        assert_eq!(unescape_field(&escape_field(original)), original);
    }
}
