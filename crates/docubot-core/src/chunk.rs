//! Boundary-aware text chunker with overlap.
//!
//! Splits document text into [`TextChunk`]s of at most `chunk_size`
//! characters. Consecutive chunks share up to `overlap` characters so a
//! passage cut at a chunk edge still appears whole in one of them.
//!
//! # Algorithm
//!
//! 1. Take a window of `chunk_size` characters from the current position.
//! 2. If the window reaches the end of the text, emit it as the final chunk.
//! 3. Otherwise look for the last break inside the window, preferring
//!    paragraph (`\n\n`), then line (`\n`), then sentence end, then word
//!    boundaries. A break is accepted only in the back half of the window,
//!    so chunks stay close to the target size.
//! 4. With no acceptable break, hard-cut at the window end.
//! 5. Start the next chunk `overlap` characters before the cut, snapped
//!    forward to the start of a word.
//!
//! Every chunk starts on a non-whitespace character, so no chunk is empty
//! or whitespace-only. Whitespace runs between chunks are skipped.
//!
//! Chunks are borrowed slices of the input. Their non-overlapping parts,
//! plus the skipped whitespace, reproduce the input exactly.
//!
//! # Example
//!
//! ```rust
//! use docubot_core::chunk::split_text;
//!
//! let chunks: Vec<_> = split_text("Hello world.\n\nSecond paragraph.", 1000, 200).collect();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].text, "Hello world.\n\nSecond paragraph.");
//! ```

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Break candidates, strongest first. Separators within a tier are equal.
const BREAK_TIERS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// A contiguous slice of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// Position of this chunk in the sequence, starting at 0.
    pub index: usize,
    /// Byte offset of the chunk in the source text.
    pub start: usize,
    /// The chunk content.
    pub text: &'a str,
}

impl TextChunk<'_> {
    /// Byte offset one past the end of the chunk in the source text.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    chunk_size: usize,
    overlap: usize,
}

impl Splitter {
    /// `chunk_size` is raised to at least 1 and `overlap` is capped at
    /// `chunk_size - 1`; callers validate user input before getting here.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily split `text`. Empty or whitespace-only text yields nothing.
    ///
    /// The returned iterator is `Clone`; cloning it (or calling `split`
    /// again) restarts the sequence.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            splitter: *self,
            next_start: Some(0),
            prev_end: 0,
            index: 0,
        }
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

/// Split `text` into chunks of at most `chunk_size` characters overlapping
/// by up to `overlap` characters.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Chunks<'_> {
    Splitter::new(chunk_size, overlap).split(text)
}

/// Iterator over the chunks of a text. See [`Splitter::split`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    splitter: Splitter,
    next_start: Option<usize>,
    /// Byte offset where the previous chunk ended.
    prev_end: usize,
    index: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk<'a>;

    fn next(&mut self) -> Option<TextChunk<'a>> {
        let from = self.next_start?;
        let skipped = self.text[from..].len() - self.text[from..].trim_start().len();
        let start = from + skipped;
        if start >= self.text.len() {
            self.next_start = None;
            return None;
        }

        let rest = &self.text[start..];
        let carried = self.prev_end.saturating_sub(start);
        let limit = byte_offset_after_chars(rest, self.splitter.chunk_size);
        let len = if limit == rest.len() {
            limit
        } else {
            find_break(&rest[..limit], carried)
        };
        let end = start + len;

        let chunk = TextChunk {
            index: self.index,
            start,
            text: &rest[..len],
        };
        self.index += 1;

        self.prev_end = end;
        self.next_start = if end >= self.text.len() {
            None
        } else {
            Some(self.overlap_start(start, end))
        };

        Some(chunk)
    }
}

impl Chunks<'_> {
    /// Where the chunk after `start..end` begins: `overlap` characters
    /// back from `end`, moved forward to a word start. Always in
    /// `(start, end]`.
    fn overlap_start(&self, start: usize, end: usize) -> usize {
        let overlap = self.splitter.overlap;
        if overlap == 0 {
            return end;
        }
        let chunk = &self.text[start..end];
        let back = match chunk.char_indices().rev().nth(overlap - 1) {
            Some((i, _)) if i > 0 => i,
            _ => return end,
        };
        let tail = &chunk[back..];
        let snapped = tail
            .find(char::is_whitespace)
            .map(|ws| {
                let after = &tail[ws..];
                ws + (after.len() - after.trim_start().len())
            })
            .filter(|&offset| offset < tail.len())
            .unwrap_or(0);
        start + back + snapped
    }
}

/// Pick the cut point inside a full window. The cut must land past both
/// the window midpoint and the carried-over overlap.
fn find_break(window: &str, carried: usize) -> usize {
    let min_end = (window.len() / 2).max(carried);
    for tier in BREAK_TIERS {
        let best = tier
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|pos| pos + sep.len()))
            .max();
        if let Some(end) = best {
            if end > min_end {
                return end;
            }
        }
    }
    window.len()
}

/// Byte offset just past the first `n` characters of `s` (or `s.len()`).
fn byte_offset_after_chars(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}
