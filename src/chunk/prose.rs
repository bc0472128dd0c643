//! Header-section chunking for markdown and plain prose.
//!
//! Each Markdown ATX header (`#`, `##`, ...) starts a new chunk running
//! to the next header at the same or shallower depth. Text with no
//! headers at all falls back to paragraph (blank-line-delimited)
//! splitting, grounded in the same boundary-seeking idea used for
//! oversized code chunks.

use super::split_oversized;
use crate::error::Result;
use crate::types::Chunk;

fn header_depth(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = trimmed[hashes..].trim();
    if rest.is_empty() && trimmed.len() == hashes {
        return None;
    }
    Some((hashes, rest.to_string()))
}

struct Section {
    start_line: usize,
    end_line: usize,
    title: String,
}

fn split_by_headers(lines: &[&str]) -> Vec<Section> {
    let mut headers: Vec<(usize, usize, String)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some((depth, title)) = header_depth(line) {
            headers.push((i, depth, title));
        }
    }
    if headers.is_empty() {
        return Vec::new();
    }

    let mut sections = Vec::with_capacity(headers.len());
    for (idx, (line, _depth, title)) in headers.iter().enumerate() {
        let end = headers.get(idx + 1).map_or(lines.len() - 1, |next| next.0 - 1);
        sections.push(Section {
            start_line: *line,
            end_line: end.max(*line),
            title: title.clone(),
        });
    }
    sections
}

fn split_by_paragraphs(text: &str) -> Vec<(usize, usize)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut spans = Vec::new();
    let mut start = None;
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                spans.push((s, i - 1));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, lines.len() - 1));
    }
    if spans.is_empty() && !lines.is_empty() {
        spans.push((0, lines.len() - 1));
    }
    spans
}

/// Chunks markdown/prose `text` into one chunk per header section, or
/// one chunk per paragraph when no headers are present.
pub fn chunk_markdown(
    path: &str,
    text: &str,
    file_hash: &str,
    max_chunk_size: usize,
) -> Result<Vec<Chunk>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let lines: Vec<&str> = text.lines().collect();
    let overlap = ((max_chunk_size as f64) * super::DEFAULT_OVERLAP_RATIO) as usize;
    let sections = split_by_headers(&lines);

    let spans: Vec<(usize, usize, String)> = if sections.is_empty() {
        split_by_paragraphs(text)
            .into_iter()
            .map(|(s, e)| (s, e, "<anonymous>".to_string()))
            .collect()
    } else {
        sections
            .into_iter()
            .map(|s| (s.start_line, s.end_line, s.title))
            .collect()
    };

    let mut chunks = Vec::new();
    for (start_line, end_line, title) in spans {
        let body = lines[start_line..=end_line.min(lines.len() - 1)].join("\n");
        let parts = split_oversized(&body, max_chunk_size, overlap.max(1));
        let multi = parts.len() > 1;
        for (idx, (part_text, _range)) in parts.into_iter().enumerate() {
            let symbol_name = if multi {
                format!("{title} (part {})", idx + 1)
            } else {
                title.clone()
            };
            let id = Chunk::make_id(file_hash, u32::try_from(start_line + 1).unwrap_or(u32::MAX), &symbol_name, chunks.len() as u32);
            chunks.push(Chunk {
                id,
                path: path.to_string(),
                language: "prose".to_string(),
                symbol_type: "section".to_string(),
                symbol_name,
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
    fn chunk_markdown_splits_on_headers() {
        let text = "# Intro\nHello.\n\n## Details\nMore text.\n";
        let chunks = chunk_markdown("README.md", text, "hash1234", 2_000).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbol_name, "Intro");
        assert_eq!(chunks[1].symbol_name, "Details");
    }

    #[test]
    fn chunk_markdown_falls_back_to_paragraphs() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n";
        let chunks = chunk_markdown("notes.txt", text, "hash1234", 2_000).unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn chunk_markdown_empty_text_yields_no_chunks() {
        let chunks = chunk_markdown("notes.txt", "  \n", "hash1234", 2_000).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn header_depth_rejects_empty_header() {
        assert!(header_depth("###").is_none());
        assert!(header_depth("plain text").is_none());
    }
}
