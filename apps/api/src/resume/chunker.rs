//! Overlapping fixed-size windows over whitespace-collapsed resume text.
//!
//! Windows are measured in characters, not bytes, so multi-byte text never
//! splits inside a code point.

/// A chunk's position is its identity for one resume version. `start` is the
/// character offset of the window in the collapsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub text: String,
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into windows of `size` characters, each starting
/// `size - overlap` characters after the previous one (at least 1).
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    let normalized = collapse_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            text: chars[start..end].iter().collect(),
        });
        start += step;
    }
    chunks
}

/// Inverse of [`chunk_text`]. Uses each chunk's own offset, so chunks written
/// under any window settings reassemble to the original text.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut len: usize = 0;
    for chunk in chunks {
        let skip = len.saturating_sub(chunk.start);
        for ch in chunk.text.chars().skip(skip) {
            text.push(ch);
            len += 1;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("   \n\t ", 900, 150).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("Jane   Doe\n\nRust engineer", 900, 150);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "Jane Doe Rust engineer");
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = chunk_text("abcdefghij", 4, 1);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij", "j"]);
        let indices: Vec<_> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let starts: Vec<_> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_still_advances() {
        let chunks = chunk_text("abc", 2, 5);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "bc", "c"]);
    }

    #[test]
    fn test_multibyte_text() {
        let chunks = chunk_text("café über", 4, 0);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["café", " übe", "r"]);
    }

    #[test]
    fn test_reassemble_round_trips() {
        let text = "GPA 3.87 from State University, then five years of Rust";
        for (size, overlap) in [(4, 1), (10, 3), (100, 20), (3, 5)] {
            let chunks = chunk_text(text, size, overlap);
            assert_eq!(reassemble(&chunks), text);
        }
        assert_eq!(reassemble(&[]), "");
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Experience ".repeat(300);
        assert_eq!(chunk_text(&text, 900, 150), chunk_text(&text, 900, 150));
    }
}
