//! Stylesheet tokenizer.
//!
//! Splits source text into a flat list of byte-range tokens. Every byte of the input
//! belongs to exactly one token, which is what lets the parser keep the original
//! formatting around each node.

use memchr::memmem;
use pigment_relief::{ErrorCode, ParseError, Position};

/// Character codes for fast comparison
pub mod char_codes {
    pub const TAB: u8 = 0x09;
    pub const NEWLINE: u8 = 0x0A;
    pub const FORM_FEED: u8 = 0x0C;
    pub const CARRIAGE_RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    pub const EXCLAMATION_MARK: u8 = 0x21;
    pub const DOUBLE_QUOTE: u8 = 0x22;
    pub const NUMBER: u8 = 0x23;
    pub const SINGLE_QUOTE: u8 = 0x27;
    pub const LEFT_PAREN: u8 = 0x28;
    pub const RIGHT_PAREN: u8 = 0x29;
    pub const ASTERISK: u8 = 0x2A;
    pub const COMMA: u8 = 0x2C;
    pub const SLASH: u8 = 0x2F;
    pub const COLON: u8 = 0x3A;
    pub const SEMI: u8 = 0x3B;
    pub const AT: u8 = 0x40;
    pub const LEFT_SQUARE: u8 = 0x5B;
    pub const BACKSLASH: u8 = 0x5C;
    pub const RIGHT_SQUARE: u8 = 0x5D;
    pub const LEFT_BRACE: u8 = 0x7B;
    pub const RIGHT_BRACE: u8 = 0x7D;
}

use char_codes::*;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenKind {
    Space,
    Word,
    String,
    AtWord,
    Comment,
    /// A parenthesized run kept as one token (`(1px)`, unquoted `url(...)` bodies)
    Brackets,
    OpenParen,
    CloseParen,
    OpenSquare,
    CloseSquare,
    OpenCurly,
    CloseCurly,
    Colon,
    Semicolon,
}

/// Token: kind plus byte range `[start, end)` in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    #[inline]
    pub fn is_space_or_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Space | TokenKind::Comment)
    }
}

#[inline]
const fn is_space(c: u8) -> bool {
    matches!(
        c,
        SPACE | NEWLINE | TAB | CARRIAGE_RETURN | FORM_FEED
    )
}

/// Bytes that end a word
#[inline]
const fn is_word_end(c: u8) -> bool {
    matches!(
        c,
        TAB | NEWLINE
            | FORM_FEED
            | CARRIAGE_RETURN
            | SPACE
            | EXCLAMATION_MARK
            | DOUBLE_QUOTE
            | NUMBER
            | SINGLE_QUOTE
            | LEFT_PAREN
            | RIGHT_PAREN
            | COMMA
            | COLON
            | SEMI
            | AT
            | LEFT_SQUARE
            | BACKSLASH
            | RIGHT_SQUARE
            | LEFT_BRACE
            | RIGHT_BRACE
    )
}

/// Bytes that end an at-rule name
#[inline]
const fn is_at_end(c: u8) -> bool {
    matches!(
        c,
        TAB | NEWLINE
            | FORM_FEED
            | CARRIAGE_RETURN
            | SPACE
            | DOUBLE_QUOTE
            | NUMBER
            | SINGLE_QUOTE
            | LEFT_PAREN
            | RIGHT_PAREN
            | SLASH
            | SEMI
            | LEFT_SQUARE
            | BACKSLASH
            | RIGHT_SQUARE
            | LEFT_BRACE
            | RIGHT_BRACE
    )
}

/// Bytes that keep a `( ... )` run from being a single brackets token
#[inline]
const fn is_bad_bracket(c: u8) -> bool {
    matches!(
        c,
        CARRIAGE_RETURN | NEWLINE | DOUBLE_QUOTE | SINGLE_QUOTE | LEFT_PAREN | SLASH | BACKSLASH
    )
}

/// Stylesheet tokenizer
pub struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    index: usize,
    /// Newline offsets for line/column lookup
    newlines: Vec<usize>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            index: 0,
            newlines: memchr::memchr_iter(NEWLINE, input.as_bytes()).collect(),
        }
    }

    /// Get the position for a byte index
    pub fn get_pos(&self, index: usize) -> Position {
        let line = match self.newlines.binary_search(&index) {
            Ok(i) => i + 1,
            Err(i) => i + 1,
        };

        let column = if line == 1 {
            index + 1
        } else {
            index - self.newlines[line - 2]
        };

        Position {
            offset: index as u32,
            line: line as u32,
            column: column as u32,
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens: Vec<Token> = Vec::new();
        while self.index < self.bytes.len() {
            let prev = tokens.last().copied();
            let token = self.next_token(prev)?;
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self, prev: Option<Token>) -> Result<Token, ParseError> {
        let start = self.index;
        let c = self.bytes[start];

        let kind = match c {
            SPACE | NEWLINE | TAB | CARRIAGE_RETURN | FORM_FEED => {
                let end = self.bytes[start..]
                    .iter()
                    .position(|&b| !is_space(b))
                    .map_or(self.bytes.len(), |i| start + i);
                return Ok(self.emit(TokenKind::Space, start, end));
            }
            LEFT_SQUARE => TokenKind::OpenSquare,
            RIGHT_SQUARE => TokenKind::CloseSquare,
            LEFT_BRACE => TokenKind::OpenCurly,
            RIGHT_BRACE => TokenKind::CloseCurly,
            COLON => TokenKind::Colon,
            SEMI => TokenKind::Semicolon,
            RIGHT_PAREN => TokenKind::CloseParen,
            LEFT_PAREN => return self.paren(prev),
            SINGLE_QUOTE | DOUBLE_QUOTE => return self.string(c),
            AT => {
                let end = self.scan(start + 1, is_at_end);
                return Ok(self.emit(TokenKind::AtWord, start, end));
            }
            BACKSLASH => return Ok(self.escape()),
            SLASH if self.bytes.get(start + 1) == Some(&ASTERISK) => return self.comment(),
            _ => {
                let end = self.word_end(start + 1);
                return Ok(self.emit(TokenKind::Word, start, end));
            }
        };
        Ok(self.emit(kind, start, start + 1))
    }

    #[inline]
    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) -> Token {
        self.index = end;
        Token::new(kind, start, end)
    }

    fn error(&self, code: ErrorCode, index: usize) -> ParseError {
        ParseError::new(code, self.get_pos(index))
    }

    /// First index at or after `from` whose byte satisfies `stop`
    fn scan(&self, from: usize, stop: fn(u8) -> bool) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| stop(b))
            .map_or(self.bytes.len(), |i| from + i)
    }

    fn word_end(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if is_word_end(b) || (b == SLASH && self.bytes.get(i + 1) == Some(&ASTERISK)) {
                return i;
            }
            i += 1;
        }
        self.bytes.len()
    }

    fn paren(&mut self, prev: Option<Token>) -> Result<Token, ParseError> {
        let start = self.index;
        let after_url = prev.is_some_and(|p| {
            p.kind == TokenKind::Word && self.input[p.start..p.end].eq_ignore_ascii_case("url")
        });
        let next = self.bytes.get(start + 1).copied();

        if after_url
            && next.is_some_and(|n| n != SINGLE_QUOTE && n != DOUBLE_QUOTE && !is_space(n))
        {
            // Unquoted url body: everything up to the first unescaped `)`
            let mut i = start + 1;
            loop {
                match memchr::memchr(RIGHT_PAREN, &self.bytes[i..]) {
                    Some(offset) => {
                        let close = i + offset;
                        if self.escaped(close) {
                            i = close + 1;
                            continue;
                        }
                        return Ok(self.emit(TokenKind::Brackets, start, close + 1));
                    }
                    None => return Err(self.error(ErrorCode::UnclosedBracket, start)),
                }
            }
        }

        match memchr::memchr(RIGHT_PAREN, &self.bytes[start + 1..]) {
            Some(offset) => {
                let close = start + 1 + offset;
                let content = &self.bytes[start + 1..close];
                if content.iter().any(|&b| is_bad_bracket(b)) {
                    Ok(self.emit(TokenKind::OpenParen, start, start + 1))
                } else {
                    Ok(self.emit(TokenKind::Brackets, start, close + 1))
                }
            }
            None => Ok(self.emit(TokenKind::OpenParen, start, start + 1)),
        }
    }

    fn string(&mut self, quote: u8) -> Result<Token, ParseError> {
        let start = self.index;
        let mut i = start + 1;
        loop {
            match memchr::memchr(quote, &self.bytes[i..]) {
                Some(offset) => {
                    let close = i + offset;
                    if self.escaped(close) {
                        i = close + 1;
                        continue;
                    }
                    return Ok(self.emit(TokenKind::String, start, close + 1));
                }
                None => return Err(self.error(ErrorCode::UnclosedString, start)),
            }
        }
    }

    fn comment(&mut self) -> Result<Token, ParseError> {
        let start = self.index;
        match memmem::find(&self.bytes[start + 2..], b"*/") {
            Some(offset) => Ok(self.emit(TokenKind::Comment, start, start + 2 + offset + 2)),
            None => Err(self.error(ErrorCode::UnclosedComment, start)),
        }
    }

    /// Backslash escape: the escaped character, or up to six hex digits and one space
    fn escape(&mut self) -> Token {
        let start = self.index;
        let mut end = start + 1;
        if let Some(ch) = self.input[end..].chars().next() {
            end += ch.len_utf8();
            if ch.is_ascii_hexdigit() {
                let mut digits = 1;
                while digits < 6 && self.bytes.get(end).is_some_and(u8::is_ascii_hexdigit) {
                    end += 1;
                    digits += 1;
                }
                if self.bytes.get(end) == Some(&SPACE) {
                    end += 1;
                }
            }
        }
        self.emit(TokenKind::Word, start, end)
    }

    /// Whether the byte at `index` is preceded by an odd run of backslashes
    fn escaped(&self, index: usize) -> bool {
        let run = self.bytes[..index]
            .iter()
            .rev()
            .take_while(|&&b| b == BACKSLASH)
            .count();
        run % 2 == 1
    }
}
