use crate::error::UpstreamError;

/// Boundary preference order for the recursive splitter. Character-level
/// splitting is the implicit final fallback.
pub const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

#[derive(Debug, Clone, Copy)]
pub struct SplitterConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_chars: 500,
            overlap_chars: 50,
        }
    }
}

impl SplitterConfig {
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.max_chars == 0 {
            return Err(UpstreamError::InvalidArgument(
                "max_chars must be positive".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(UpstreamError::InvalidArgument(format!(
                "overlap {} must be smaller than max chunk size {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

/// Splits `text` into chunks of at most `max_chars` characters, preferring
/// blank-line boundaries, then newlines, then spaces, then a character-level
/// cut. Pieces short enough to share a chunk are merged back with their
/// separator; consecutive chunks share trailing content up to
/// `overlap_chars` (exactly `overlap_chars` on the character-level path).
pub fn split_text(text: &str, config: SplitterConfig) -> Vec<String> {
    split_recursive(text, &SEPARATORS, config)
        .into_iter()
        .map(|chunk| chunk.trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

fn split_recursive(text: &str, separators: &[&str], config: SplitterConfig) -> Vec<String> {
    let Some((separator, rest)) = separators.split_first() else {
        return split_chars(text, config);
    };

    if !text.contains(separator) {
        return split_recursive(text, rest, config);
    }

    let mut chunks = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut window_len = 0usize;
    let separator_len = separator.chars().count();

    for piece in text.split(separator) {
        let piece_len = piece.chars().count();

        if piece_len > config.max_chars {
            if !window.is_empty() {
                chunks.push(window.join(separator));
                window.clear();
                window_len = 0;
            }
            chunks.extend(split_recursive(piece, rest, config));
            continue;
        }

        let prospective = window_len + piece_len + separator_len * window.len();

        if prospective > config.max_chars && !window.is_empty() {
            chunks.push(window.join(separator));
            trim_window_to_overlap(&mut window, &mut window_len, separator_len, piece_len, config);
        }

        window.push(piece);
        window_len += piece_len;
    }

    if !window.is_empty() {
        chunks.push(window.join(separator));
    }

    chunks
}

/// Drops leading pieces until the retained tail fits inside the configured
/// overlap AND the tail plus the incoming piece still fits inside a chunk.
/// Whole pieces are kept, so the effective overlap never exceeds
/// `overlap_chars` and may be shorter.
fn trim_window_to_overlap(
    window: &mut Vec<&str>,
    window_len: &mut usize,
    separator_len: usize,
    incoming_len: usize,
    config: SplitterConfig,
) {
    while !window.is_empty() {
        let tail_len = *window_len + separator_len * window.len().saturating_sub(1);
        let with_incoming = *window_len + incoming_len + separator_len * window.len();
        if tail_len <= config.overlap_chars && with_incoming <= config.max_chars {
            break;
        }
        let removed = window.remove(0);
        *window_len -= removed.chars().count();
    }
}

/// Character-level fallback: fixed-size windows advancing by
/// `max_chars - overlap_chars`, producing an exact overlap.
fn split_chars(text: &str, config: SplitterConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = config.max_chars.saturating_sub(config.overlap_chars).max(1);
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.max_chars).min(chars.len());
        pieces.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    pieces
}
