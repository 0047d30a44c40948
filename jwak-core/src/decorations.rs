//! Removal of decorative punctuation from raw source text.
//!
//! JWAK sources are written to look like chat messages, so they are full
//! of punctuation that carries no meaning. The lexer expects it gone.

use crate::lexer::OPERATOR_CHARS;

const TYPOGRAPHIC: &[char] = &[
    '…', '·', '“', '”', '‘', '’', '。', '、', '！', '？', '～',
];

pub fn strip_decorations(source: &str) -> String {
    source.chars().filter(|ch| !is_decoration(*ch)).collect()
}

fn is_decoration(ch: char) -> bool {
    if OPERATOR_CHARS.contains(&ch) {
        return false;
    }
    ch.is_ascii_punctuation() || TYPOGRAPHIC.contains(&ch)
}
