//! Fixed-size character windows with overlap.

use crate::{Error, Result};

/// Default window width in characters.
pub const DEFAULT_MAX_CHARS: usize = 700;
/// Default number of characters repeated between consecutive windows.
pub const DEFAULT_OVERLAP: usize = 100;
/// Prefix shared by every chunk id.
pub const DEFAULT_ID_PREFIX: &str = "cv_chunk";
/// Section tag attached to every chunk.
pub const DEFAULT_SECTION: &str = "cv";

/// One window of source text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Stable sequential identifier, e.g. `cv_chunk_007`.
    pub id: String,
    /// Trimmed window text.
    pub text: String,
    /// Section tag.
    pub section: String,
    /// Character offset where the window starts.
    pub char_start: usize,
    /// Character offset one past the window end.
    pub char_end: usize,
}

/// Window geometry and labelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Window width in characters.
    pub max_chars: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// Prefix for generated ids.
    pub id_prefix: String,
    /// Section tag copied onto every chunk.
    pub section: String,
}

impl ChunkConfig {
    /// Builds a config with the default labels.
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        Self {
            max_chars,
            overlap,
            ..Self::default()
        }
    }

    /// Rejects geometries where the cursor could not advance.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(Error::config("chunk max_chars must be greater than zero"));
        }
        if self.overlap >= self.max_chars {
            return Err(Error::config(format!(
                "chunk overlap ({}) must be smaller than max_chars ({})",
                self.overlap, self.max_chars
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.max_chars - self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            section: DEFAULT_SECTION.to_string(),
        }
    }
}

/// Splits text into overlapping windows.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Validates the config and builds a chunker.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Lazily walks `text` left to right.
    pub fn chunks<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        let mut offsets: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
        offsets.push(text.len());
        Chunks {
            config: &self.config,
            text,
            offsets,
            cursor: 0,
            next_id: 0,
        }
    }
}

/// Iterator returned by [`Chunker::chunks`].
#[derive(Debug)]
pub struct Chunks<'a> {
    config: &'a ChunkConfig,
    text: &'a str,
    // byte offset of every char, plus the text length as a sentinel
    offsets: Vec<usize>,
    cursor: usize,
    next_id: usize,
}

impl Chunks<'_> {
    fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let len = self.char_len();
        while self.cursor < len {
            let start = self.cursor;
            let end = (start + self.config.max_chars).min(len);
            self.cursor = start + self.config.stride();

            let window = &self.text[self.offsets[start]..self.offsets[end]];
            let trimmed = window.trim();
            if trimmed.is_empty() {
                continue;
            }

            let id = format!("{}_{:03}", self.config.id_prefix, self.next_id);
            self.next_id += 1;
            return Some(Chunk {
                id,
                text: trimmed.to_string(),
                section: self.config.section.clone(),
                char_start: start,
                char_end: end,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_chars: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkConfig::new(max_chars, overlap)).expect("valid config")
    }

    #[test]
    fn splits_without_overlap() {
        let chunker = chunker(10, 0);
        let chunks: Vec<_> = chunker.chunks("0123456789abcdefghij").collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "0123456789");
        assert_eq!(chunks[1].text, "abcdefghij");
    }

    #[test]
    fn overlapping_windows_repeat_the_tail() {
        let chunker = chunker(10, 5);
        let chunks: Vec<_> = chunker.chunks("0123456789abcdefghij").collect();
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["0123456789", "56789abcde", "abcdefghij", "fghij"]);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].char_end - pair[1].char_start, 5);
        }
        assert_eq!(chunks.last().unwrap().char_end, 20);
    }

    #[test]
    fn ids_are_zero_padded_and_sequential() {
        let chunker = chunker(4, 1);
        let ids: Vec<_> = chunker
            .chunks("abcdefghijklmnopqrstuvwxyz")
            .map(|c| c.id)
            .collect();
        assert_eq!(ids[0], "cv_chunk_000");
        assert_eq!(ids[1], "cv_chunk_001");
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn blank_windows_are_skipped_without_consuming_ids() {
        let text = format!("{}{}{}", "a".repeat(5), " ".repeat(10), "b".repeat(5));
        let chunker = chunker(5, 0);
        let chunks: Vec<_> = chunker.chunks(&text).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "cv_chunk_000");
        assert_eq!(chunks[1].id, "cv_chunk_001");
        assert_eq!(chunks[1].text, "bbbbb");
        assert_eq!(chunks[1].char_start, 15);
    }

    #[test]
    fn windows_count_characters_not_bytes() {
        let chunker = chunker(3, 0);
        let chunks: Vec<_> = chunker.chunks("ñandú café").collect();
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["ñan", "dú", "caf", "é"]);
    }

    #[test]
    fn text_is_trimmed() {
        let chunker = chunker(8, 0);
        let chunk = chunker.chunks("  hola  ").next().expect("one chunk");
        assert_eq!(chunk.text, "hola");
        assert_eq!(chunk.section, "cv");
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(chunker(10, 2).chunks("").count(), 0);
    }

    #[test]
    fn overlap_must_be_smaller_than_window() {
        let err = Chunker::new(ChunkConfig::new(10, 10)).expect_err("rejected");
        assert!(matches!(err, Error::Configuration(_)));
        assert!(Chunker::new(ChunkConfig::new(10, 25)).is_err());
        assert!(Chunker::new(ChunkConfig::new(0, 0)).is_err());
    }

    #[test]
    fn default_geometry_matches_ingestion_defaults() {
        let config = ChunkConfig::default();
        assert_eq!(config.max_chars, 700);
        assert_eq!(config.overlap, 100);
        assert!(config.validate().is_ok());
    }
}
