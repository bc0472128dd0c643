//! Splitting source text into retrievable [`crate::types::Chunk`]s.
//!
//! Two strategies are provided: [`code`] for source files, one chunk per
//! top-level declaration, and [`prose`] for markdown/plain text, one
//! chunk per header section. Both are driven through [`chunk_file`],
//! which dispatches on [`Language`].

pub mod code;
pub mod prose;

use crate::error::Result;
use crate::types::Chunk;

/// Default maximum size, in characters, before a chunk is split further.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2_000;

/// Default overlap between split sub-chunks, as a fraction of
/// [`DEFAULT_MAX_CHUNK_SIZE`].
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.15;

/// Source language (or prose) detected for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Rust source.
    Rust,
    /// Python source.
    Python,
    /// JavaScript or TypeScript source.
    JavaScript,
    /// Go source.
    Go,
    /// Java source.
    Java,
    /// C or C++ source.
    C,
    /// Ruby source.
    Ruby,
    /// PHP source.
    Php,
    /// Markdown or unstructured prose.
    Prose,
}

impl Language {
    /// Detects a language from a file's extension, defaulting to
    /// [`Language::Prose`] for anything unrecognized.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let ext = path.rsplit('.').next().unwrap_or("");
        match ext {
            "rs" => Self::Rust,
            "py" => Self::Python,
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => Self::JavaScript,
            "go" => Self::Go,
            "java" => Self::Java,
            "c" | "h" | "cc" | "cpp" | "hpp" | "cxx" => Self::C,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            _ => Self::Prose,
        }
    }

    /// Name reported in [`Chunk::language`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Go => "go",
            Self::Java => "java",
            Self::C => "c",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Prose => "prose",
        }
    }
}

/// Chunks a single file's contents, dispatching on language.
///
/// `path` is stored verbatim on each emitted [`Chunk`], `bytes` is the
/// raw file content (hashed into `file_hash`), and `max_chunk_size`
/// bounds chunk length in characters (0 uses [`DEFAULT_MAX_CHUNK_SIZE`]).
pub fn chunk_file(path: &str, bytes: &[u8], max_chunk_size: usize) -> Result<Vec<Chunk>> {
    let max_chunk_size = if max_chunk_size == 0 {
        DEFAULT_MAX_CHUNK_SIZE
    } else {
        max_chunk_size
    };
    let text = String::from_utf8_lossy(bytes);
    let file_hash = Chunk::short_hash(bytes);
    let language = Language::from_path(path);

    match language {
        Language::Prose => prose::chunk_markdown(path, &text, &file_hash, max_chunk_size),
        lang => code::chunk_code(path, &text, lang, &file_hash, max_chunk_size),
    }
}

/// Splits an over-long chunk body into `max_size`-bounded windows with
/// `overlap` characters of trailing context repeated at each split,
/// appending `(part N)` to `symbol_name` on every sub-chunk past the
/// first. Shared by [`code`] and [`prose`] so oversized chunks from
/// either strategy behave identically.
pub(crate) fn split_oversized(
    text: &str,
    max_size: usize,
    overlap: usize,
) -> Vec<(String, std::ops::Range<usize>)> {
    if text.chars().count() <= max_size {
        return vec![(text.to_string(), 0..text.chars().count())];
    }

    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + max_size).min(chars.len());
        let part: String = chars[start..end].iter().collect();
        parts.push((part, start..end));
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_path_detects_rust() {
        assert_eq!(Language::from_path("src/lib.rs"), Language::Rust);
    }

    #[test]
    fn language_from_path_defaults_to_prose() {
        assert_eq!(Language::from_path("README"), Language::Prose);
        assert_eq!(Language::from_path("notes.md"), Language::Prose);
    }

    #[test]
    fn split_oversized_keeps_short_text_whole() {
        let parts = split_oversized("hello", 100, 10);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].0, "hello");
    }

    #[test]
    fn split_oversized_splits_long_text_with_overlap() {
        let text = "a".repeat(250);
        let parts = split_oversized(&text, 100, 20);
        assert!(parts.len() >= 3);
        for (part, _) in &parts {
            assert!(part.chars().count() <= 100);
        }
    }
}
