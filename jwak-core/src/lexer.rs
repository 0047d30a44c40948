//! Lexer for JWAK source text.
//!
//! Every value in the language is spelled as a count of repeated glyphs,
//! so the lexer only recognizes token *shapes*. The raw text of each
//! token is kept and decoded later by the AST layer.

use log::trace;

use crate::error::CoreError;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,     // 교주님
    Symbol,      // 슝, 슈우…웅
    Operator,    // ~ @ ; ,
    Number,      // 좍, 좌아…악
    Input,       // 순수ㅋ…따잇
    OutputChar,  // 비비ㅋ…따잇
    OutputValue, // 비비ㅋ…보호막따잇
    Goto,        // 에잇ㅋ…
    Condition,   // 하는재미
    LineEnd,     // \n+
    Whitespace,
}

/// A single token.
///
/// `offset` is the byte offset of `text` inside the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub offset: usize,
}

pub const KEYWORD: &str = "교주님";
pub const CONDITION: &str = "하는재미";
pub const SYMBOL_SHORT: &str = "슝";
pub const NUMBER_SHORT: &str = "좍";
pub const OPERATOR_CHARS: [char; 4] = ['~', '@', ';', ','];
/// Address glyph shared by the input, output and goto families.
pub const ADDRESS_GLYPH: &str = "ㅋ";
pub const JUMP_MARKER: &str = "에잇";

type Rule = (TokenKind, fn(&str) -> Option<usize>);

/// Ordered rule table. The first rule matching at the current position wins.
const RULES: &[Rule] = &[
    (TokenKind::Keyword, keyword),
    (TokenKind::Symbol, symbol),
    (TokenKind::Operator, operator),
    (TokenKind::Number, number),
    (TokenKind::Input, input),
    (TokenKind::OutputChar, output_char),
    (TokenKind::OutputValue, output_value),
    (TokenKind::Goto, goto),
    (TokenKind::Condition, condition),
    (TokenKind::LineEnd, line_end),
    (TokenKind::Whitespace, whitespace),
];

/// Start lexing `source`.
///
/// The returned iterator is lazy and yields whitespace-free tokens until
/// the input is exhausted or the first error is hit. Calling `lex` again
/// on the same source restarts from the beginning.
pub fn lex(source: &str) -> Lexer<'_> {
    Lexer {
        source,
        index: 0,
        failed: false,
    }
}

/// Lex the whole source eagerly.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, CoreError> {
    lex(source).collect()
}

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    index: usize,
    failed: bool,
}

impl<'src> Lexer<'src> {
    fn next_raw(&mut self) -> Option<Result<Token<'src>, CoreError>> {
        if self.failed || self.index >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.index..];
        for (kind, rule) in RULES {
            if let Some(len) = rule(rest).filter(|len| *len > 0) {
                let token = Token {
                    kind: *kind,
                    text: &rest[..len],
                    offset: self.index,
                };
                self.index += len;
                return Some(Ok(token));
            }
        }

        self.failed = true;
        let character = rest.chars().next().unwrap_or('\0');
        Some(Err(CoreError::LexError {
            position: self.index,
            character,
        }))
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_raw()? {
                Ok(token) if token.kind == TokenKind::Whitespace => continue,
                Ok(token) => {
                    trace!("token {:?} {:?} at byte {}", token.kind, token.text, token.offset);
                    return Some(Ok(token));
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Tiny matcher over the remaining input, used to spell out the rule
/// patterns. Each step returns `None` when the pattern does not match.
struct Scan<'a> {
    rest: &'a str,
    consumed: usize,
}

impl<'a> Scan<'a> {
    fn new(text: &'a str) -> Self {
        Scan {
            rest: text,
            consumed: 0,
        }
    }

    fn literal(&mut self, glyph: &str) -> Option<()> {
        let rest = self.rest.strip_prefix(glyph)?;
        self.rest = rest;
        self.consumed += glyph.len();
        Some(())
    }

    fn repeat(&mut self, glyph: &str, min: usize) -> Option<usize> {
        self.repeat_bounded(glyph, min, usize::MAX)
    }

    fn repeat_bounded(&mut self, glyph: &str, min: usize, max: usize) -> Option<usize> {
        let mut count = 0;
        while count < max && self.literal(glyph).is_some() {
            count += 1;
        }
        (count >= min).then_some(count)
    }

    fn any_of(&mut self, set: &[char], min: usize) -> Option<usize> {
        let mut count = 0;
        while let Some(ch) = self.rest.chars().next().filter(|ch| set.contains(ch)) {
            self.rest = &self.rest[ch.len_utf8()..];
            self.consumed += ch.len_utf8();
            count += 1;
        }
        (count >= min).then_some(count)
    }

    fn done(self) -> Option<usize> {
        Some(self.consumed)
    }
}

fn keyword(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.literal(KEYWORD)?;
    scan.done()
}

fn symbol(text: &str) -> Option<usize> {
    if text.starts_with(SYMBOL_SHORT) {
        return Some(SYMBOL_SHORT.len());
    }
    let mut scan = Scan::new(text);
    scan.literal("슈")?;
    scan.repeat("우", 0)?;
    scan.literal("웅")?;
    scan.done()
}

fn operator(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.any_of(&OPERATOR_CHARS, 1)?;
    scan.done()
}

fn number(text: &str) -> Option<usize> {
    if text.starts_with(NUMBER_SHORT) {
        return Some(NUMBER_SHORT.len());
    }
    let mut scan = Scan::new(text);
    scan.literal("좌")?;
    scan.repeat("아", 0)?;
    scan.literal("악")?;
    scan.done()
}

/// `따+잇ㅋ*`, the activation tail shared by input and output tokens.
fn activation(scan: &mut Scan<'_>) -> Option<()> {
    scan.repeat("따", 1)?;
    scan.literal("잇")?;
    scan.repeat(ADDRESS_GLYPH, 0)?;
    Some(())
}

fn input(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.literal("순수")?;
    scan.repeat(ADDRESS_GLYPH, 0)?;
    activation(&mut scan)?;
    scan.done()
}

fn output_char(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.literal("비비")?;
    scan.repeat(ADDRESS_GLYPH, 0)?;
    scan.any_of(&[' '], 0)?;
    activation(&mut scan)?;
    scan.done()
}

fn output_value(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.literal("비비")?;
    scan.repeat(ADDRESS_GLYPH, 0)?;
    scan.any_of(&[' '], 0)?;
    scan.literal("보호막")?;
    scan.repeat(ADDRESS_GLYPH, 0)?;
    activation(&mut scan)?;
    scan.done()
}

fn goto(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.repeat_bounded(JUMP_MARKER, 1, 2)?;
    scan.repeat(ADDRESS_GLYPH, 0)?;
    scan.done()
}

fn condition(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.literal(CONDITION)?;
    scan.done()
}

fn line_end(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.any_of(&['\n'], 1)?;
    scan.done()
}

fn whitespace(text: &str) -> Option<usize> {
    let mut scan = Scan::new(text);
    scan.any_of(&[' ', '\t', '\r'], 1)?;
    scan.done()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("lex")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn recognizes_every_token_family() {
        let source = "교주님 슝 슈우웅 ~; 좍 좌아악 순수ㅋ따잇 비비ㅋ따잇 비비ㅋ보호막따잇 에잇ㅋㅋ 하는재미\n\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Keyword,
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Input,
                TokenKind::OutputChar,
                TokenKind::OutputValue,
                TokenKind::Goto,
                TokenKind::Condition,
                TokenKind::LineEnd,
            ]
        );
    }

    #[test]
    fn collapses_consecutive_line_breaks() {
        let tokens = tokenize("슝\n\n\n좍").expect("lex");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::LineEnd);
        assert_eq!(tokens[1].text, "\n\n\n");
    }

    #[test]
    fn output_token_may_contain_spaces_before_activation() {
        let tokens = tokenize("비비ㅋ  따따잇").expect("lex");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::OutputChar);
        assert_eq!(tokens[0].text, "비비ㅋ  따따잇");
    }

    #[test]
    fn goto_marker_is_taken_at_most_twice() {
        let tokens = tokenize("에잇에잇에잇ㅋ").expect("lex");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "에잇에잇");
        assert_eq!(tokens[1].text, "에잇ㅋ");
    }

    #[test]
    fn offsets_point_into_source() {
        let source = "슝 좍";
        let tokens = tokenize(source).expect("lex");
        for token in &tokens {
            assert_eq!(&source[token.offset..token.offset + token.text.len()], token.text);
        }
        assert_eq!(tokens[1].offset, "슝 ".len());
    }

    #[test]
    fn rejoined_tokens_reconstruct_source_without_whitespace() {
        let source = "슝 좌아아악\n~ 슈우웅\t교주님\n에잇ㅋ";
        let rejoined: String = tokenize(source)
            .expect("lex")
            .iter()
            .map(|token| token.text)
            .collect();
        let expected: String = source
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '\t' | '\r'))
            .collect();
        assert_eq!(rejoined, expected);
    }

    #[test]
    fn reports_offset_and_character_of_unknown_input() {
        let err = tokenize("슝 x").unwrap_err();
        assert_eq!(
            err,
            CoreError::LexError {
                position: "슝 ".len(),
                character: 'x',
            }
        );
    }

    #[test]
    fn stops_after_first_error() {
        let items: Vec<_> = lex("슝 ? 좍").collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn lexing_is_restartable() {
        let source = "슝 좍\n비비ㅋ따잇";
        let first: Vec<_> = lex(source).collect();
        let second: Vec<_> = lex(source).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn incomplete_family_prefix_is_an_error() {
        assert!(matches!(
            tokenize("슈우우").unwrap_err(),
            CoreError::LexError { position: 0, character: '슈' }
        ));
    }
}
