//! Overlapping word-window chunking.

use crate::error::{MemoryError, Result};

/// Split `text` into windows of `max_words` whitespace-delimited words, each
/// window starting `max_words - overlap_words` words after the previous one.
///
/// Stops once a window reaches the end of the text, so the last window may be
/// shorter. Empty or whitespace-only text yields no chunks. Rejects
/// `max_words == 0` and `overlap_words >= max_words`.
pub fn chunk_words(text: &str, max_words: usize, overlap_words: usize) -> Result<Vec<String>> {
    validate(max_words, overlap_words)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = max_words - overlap_words;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + max_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Check chunk parameters without chunking anything.
pub fn validate(max_words: usize, overlap_words: usize) -> Result<()> {
    if max_words == 0 {
        return Err(MemoryError::config("max_words must be greater than 0"));
    }
    if overlap_words >= max_words {
        return Err(MemoryError::config(format!(
            "overlap_words ({overlap_words}) must be less than max_words ({max_words})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    fn expected_count(w: usize, m: usize, o: usize) -> usize {
        match w {
            0 => 0,
            w if w <= o => 1,
            w => (w - o).div_ceil(m - o),
        }
    }

    #[test]
    fn thousand_words_make_four_chunks() {
        let chunks = chunk_words(&words(1000), 300, 50).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].starts_with("w0 "));
        assert!(chunks[1].starts_with("w250 "));
        assert!(chunks[3].starts_with("w750 "));
        assert!(chunks[3].ends_with("w999"));
        assert_eq!(chunks[3].split_whitespace().count(), 250);
    }

    #[test]
    fn chunk_count_matches_formula() {
        for (w, m, o) in [
            (1, 3, 0),
            (3, 3, 0),
            (4, 3, 0),
            (10, 4, 1),
            (10, 4, 3),
            (2, 5, 4),
            (5, 5, 4),
            (6, 5, 4),
            (301, 300, 50),
            (550, 300, 50),
            (551, 300, 50),
        ] {
            let chunks = chunk_words(&words(w), m, o).unwrap();
            assert_eq!(chunks.len(), expected_count(w, m, o), "W={w} M={m} O={o}");
        }
    }

    #[test]
    fn consecutive_chunks_overlap_by_exactly_o_words() {
        let (m, o) = (7, 3);
        let source = words(40);
        let chunks = chunk_words(&source, m, o).unwrap();

        let mut rebuilt: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let ws: Vec<&str> = chunk.split_whitespace().collect();
            assert!(ws.len() <= m);
            if i > 0 {
                let tail = &rebuilt[rebuilt.len() - o..];
                assert_eq!(tail, &ws[..o].iter().map(|s| s.to_string()).collect::<Vec<_>>()[..]);
                rebuilt.extend(ws[o..].iter().map(|s| s.to_string()));
            } else {
                rebuilt.extend(ws.iter().map(|s| s.to_string()));
            }
        }
        assert_eq!(rebuilt.join(" "), source);
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        assert!(chunk_words("", 300, 50).unwrap().is_empty());
        assert!(chunk_words(" \n\t  ", 300, 50).unwrap().is_empty());
    }

    #[test]
    fn whitespace_runs_collapse() {
        let chunks = chunk_words("a\n\nb\t c", 10, 0).unwrap();
        assert_eq!(chunks, vec!["a b c".to_string()]);
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert_eq!(chunk_words("a b", 0, 0).unwrap_err().kind(), "configuration");
        assert_eq!(chunk_words("a b", 5, 5).unwrap_err().kind(), "configuration");
        assert_eq!(chunk_words("a b", 5, 9).unwrap_err().kind(), "configuration");
    }
}
