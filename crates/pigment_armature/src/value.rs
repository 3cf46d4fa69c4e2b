//! Value tokenizer.
//!
//! Splits declaration values and at-rule parameters into words, strings, dividers,
//! whitespace, comments and function calls. Whitespace next to a divider is kept on
//! the divider, and whitespace just inside parentheses is kept on the function, so
//! [`stringify_value`] reproduces the input exactly.

use pigment_carton::CompactString;
use serde::Serialize;

use crate::tokenizer::char_codes::*;

/// One value token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueNode {
    Word {
        value: CompactString,
    },
    String {
        value: String,
        quote: char,
        unclosed: bool,
    },
    /// `,` `/` `:` with the whitespace around it
    Div {
        value: char,
        before: CompactString,
        after: CompactString,
    },
    Space {
        value: CompactString,
    },
    Comment {
        value: String,
        unclosed: bool,
    },
    /// `name( ... )`; an unnamed parenthesized group has an empty name
    Function {
        name: CompactString,
        nodes: Vec<ValueNode>,
        before: CompactString,
        after: CompactString,
        unclosed: bool,
    },
}

impl ValueNode {
    #[inline]
    pub fn is_word(&self) -> bool {
        matches!(self, Self::Word { .. })
    }

    /// Word with exactly this text
    #[inline]
    pub fn is_word_eq(&self, text: &str) -> bool {
        matches!(self, Self::Word { value } if value == text)
    }

    #[inline]
    pub fn is_space(&self) -> bool {
        matches!(self, Self::Space { .. })
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String { .. })
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function { .. })
    }

    #[inline]
    pub fn is_comma(&self) -> bool {
        matches!(self, Self::Div { value: ',', .. })
    }

    #[inline]
    pub fn is_colon(&self) -> bool {
        matches!(self, Self::Div { value: ':', .. })
    }

    #[inline]
    pub fn is_from_word(&self) -> bool {
        self.is_word_eq("from")
    }

    #[inline]
    pub fn is_as_word(&self) -> bool {
        self.is_word_eq("as")
    }

    /// Word text, if this is a word
    pub fn word(&self) -> Option<&str> {
        match self {
            Self::Word { value } => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Drop leading and trailing whitespace tokens
pub fn trim_spaces(nodes: &[ValueNode]) -> &[ValueNode] {
    let start = nodes.iter().position(|n| !n.is_space()).unwrap_or(nodes.len());
    let end = nodes.iter().rposition(|n| !n.is_space()).map_or(start, |i| i + 1);
    &nodes[start..end]
}

/// Tokenize a value
pub fn parse_value(input: &str) -> Vec<ValueNode> {
    ValueParser::new(input).parse()
}

/// Print tokens back to text
pub fn stringify_value(nodes: &[ValueNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes);
    out
}

fn write_nodes(out: &mut String, nodes: &[ValueNode]) {
    for node in nodes {
        write_node(out, node);
    }
}

fn write_node(out: &mut String, node: &ValueNode) {
    match node {
        ValueNode::Word { value } | ValueNode::Space { value } => out.push_str(value),
        ValueNode::String {
            value,
            quote,
            unclosed,
        } => {
            out.push(*quote);
            out.push_str(value);
            if !unclosed {
                out.push(*quote);
            }
        }
        ValueNode::Div {
            value,
            before,
            after,
        } => {
            out.push_str(before);
            out.push(*value);
            out.push_str(after);
        }
        ValueNode::Comment { value, unclosed } => {
            out.push_str("/*");
            out.push_str(value);
            if !unclosed {
                out.push_str("*/");
            }
        }
        ValueNode::Function {
            name,
            nodes,
            before,
            after,
            unclosed,
        } => {
            out.push_str(name);
            out.push('(');
            out.push_str(before);
            write_nodes(out, nodes);
            out.push_str(after);
            if !unclosed {
                out.push(')');
            }
        }
    }
}

/// Visit every word mutably, including words nested in function arguments.
///
/// Strings and comments are not visited.
pub fn walk_words_mut<F>(nodes: &mut [ValueNode], f: &mut F)
where
    F: FnMut(&mut CompactString),
{
    for node in nodes {
        match node {
            ValueNode::Word { value } => f(value),
            ValueNode::Function { nodes, .. } => walk_words_mut(nodes, f),
            _ => {}
        }
    }
}

#[inline]
const fn is_blank(c: u8) -> bool {
    c <= SPACE
}

/// Function frame: the function being filled plus the token list it interrupted
struct Frame {
    name: CompactString,
    before: CompactString,
    outer: Vec<ValueNode>,
}

struct ValueParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<ValueNode>,
    stack: Vec<Frame>,
    /// Name waiting for a `(`
    name: CompactString,
    /// Whitespace waiting for the next divider
    before: CompactString,
    /// Whitespace waiting for the closing `)`
    after: CompactString,
}

impl<'a> ValueParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            stack: Vec::new(),
            name: CompactString::default(),
            before: CompactString::default(),
            after: CompactString::default(),
        }
    }

    #[inline]
    fn peek(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    fn in_calc(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|frame| frame.name.eq_ignore_ascii_case("calc"))
    }

    fn blank_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| !is_blank(b))
            .map_or(self.bytes.len(), |i| from + i)
    }

    fn parse(mut self) -> Vec<ValueNode> {
        while self.pos < self.bytes.len() {
            let code = self.bytes[self.pos];
            match code {
                c if is_blank(c) => self.whitespace(),
                SINGLE_QUOTE | DOUBLE_QUOTE => self.string(code),
                SLASH if self.peek(self.pos + 1) == Some(ASTERISK) => self.comment(),
                SLASH | ASTERISK if self.in_calc() => {
                    self.tokens.push(ValueNode::Word {
                        value: CompactString::from(&self.input[self.pos..self.pos + 1]),
                    });
                    self.pos += 1;
                }
                SLASH | COMMA | COLON => {
                    self.tokens.push(ValueNode::Div {
                        value: code as char,
                        before: std::mem::take(&mut self.before),
                        after: CompactString::default(),
                    });
                    self.pos += 1;
                }
                LEFT_PAREN => self.open_paren(),
                RIGHT_PAREN if !self.stack.is_empty() => self.close_paren(),
                _ => self.word(),
            }
        }

        // Unclosed functions at end of input
        while let Some(frame) = self.stack.pop() {
            let nodes = std::mem::replace(&mut self.tokens, frame.outer);
            self.tokens.push(ValueNode::Function {
                name: frame.name,
                nodes,
                before: frame.before,
                after: std::mem::take(&mut self.after),
                unclosed: true,
            });
        }
        self.tokens
    }

    fn whitespace(&mut self) {
        let next = self.blank_end(self.pos);
        let token = CompactString::from(&self.input[self.pos..next]);
        let code = self.peek(next);
        self.pos = next;

        if code == Some(RIGHT_PAREN) && !self.stack.is_empty() {
            self.after = token;
            return;
        }
        if let Some(ValueNode::Div { after, .. }) = self.tokens.last_mut() {
            *after = token;
            return;
        }
        let before_div = match code {
            Some(COMMA) | Some(COLON) => true,
            Some(SLASH) => self.peek(next + 1) != Some(ASTERISK) && !self.in_calc(),
            _ => false,
        };
        if before_div {
            self.before = token;
        } else {
            self.tokens.push(ValueNode::Space { value: token });
        }
    }

    fn string(&mut self, quote: u8) {
        let start = self.pos + 1;
        let mut i = start;
        let close = loop {
            match memchr::memchr(quote, &self.bytes[i..]) {
                Some(offset) => {
                    let candidate = i + offset;
                    let slashes = self.bytes[start..candidate]
                        .iter()
                        .rev()
                        .take_while(|&&b| b == BACKSLASH)
                        .count();
                    if slashes % 2 == 1 {
                        i = candidate + 1;
                        continue;
                    }
                    break Some(candidate);
                }
                None => break None,
            }
        };

        let (value, unclosed, next) = match close {
            Some(close) => (&self.input[start..close], false, close + 1),
            None => (&self.input[start..], true, self.bytes.len()),
        };
        self.tokens.push(ValueNode::String {
            value: value.to_owned(),
            quote: quote as char,
            unclosed,
        });
        self.pos = next;
    }

    fn comment(&mut self) {
        let start = self.pos + 2;
        let (value, unclosed, next) = match memchr::memmem::find(&self.bytes[start..], b"*/") {
            Some(offset) => (&self.input[start..start + offset], false, start + offset + 2),
            None => (&self.input[start..], true, self.bytes.len()),
        };
        self.tokens.push(ValueNode::Comment {
            value: value.to_owned(),
            unclosed,
        });
        self.pos = next;
    }

    fn open_paren(&mut self) {
        let open = self.pos;
        let next = self.blank_end(open + 1);
        let before = CompactString::from(&self.input[open + 1..next]);
        let name = std::mem::take(&mut self.name);
        self.pos = next;

        let quoted = matches!(self.peek(next), Some(SINGLE_QUOTE | DOUBLE_QUOTE));
        if name.eq_ignore_ascii_case("url") && !quoted {
            self.url(name, before, open);
            return;
        }

        let outer = std::mem::take(&mut self.tokens);
        self.stack.push(Frame {
            name,
            before,
            outer,
        });
    }

    /// Unquoted `url(...)`: the argument is one word
    fn url(&mut self, name: CompactString, before: CompactString, open: usize) {
        let body_start = self.pos;
        let mut search = body_start;
        let close = loop {
            match memchr::memchr(RIGHT_PAREN, &self.bytes[search..]) {
                Some(offset) => {
                    let candidate = search + offset;
                    let slashes = self.bytes[..candidate]
                        .iter()
                        .rev()
                        .take_while(|&&b| b == BACKSLASH)
                        .count();
                    if slashes % 2 == 1 {
                        search = candidate + 1;
                        continue;
                    }
                    break Some(candidate);
                }
                None => break None,
            }
        };
        let (end, unclosed) = match close {
            Some(close) => (close, false),
            None => (self.bytes.len(), true),
        };

        let trimmed_end = self.bytes[open + 1..end]
            .iter()
            .rposition(|&b| !is_blank(b))
            .map_or(body_start, |i| open + 1 + i + 1)
            .max(body_start);

        let mut nodes = Vec::new();
        if trimmed_end > body_start {
            nodes.push(ValueNode::Word {
                value: CompactString::from(&self.input[body_start..trimmed_end]),
            });
        }
        let trailing = CompactString::from(&self.input[trimmed_end..end]);
        let after = if unclosed && !trailing.is_empty() {
            nodes.push(ValueNode::Space { value: trailing });
            CompactString::default()
        } else {
            trailing
        };

        self.tokens.push(ValueNode::Function {
            name,
            nodes,
            before,
            after,
            unclosed,
        });
        self.pos = if unclosed { end } else { end + 1 };
    }

    fn close_paren(&mut self) {
        self.pos += 1;
        if let Some(frame) = self.stack.pop() {
            let nodes = std::mem::replace(&mut self.tokens, frame.outer);
            self.tokens.push(ValueNode::Function {
                name: frame.name,
                nodes,
                before: frame.before,
                after: std::mem::take(&mut self.after),
                unclosed: false,
            });
        }
    }

    fn word(&mut self) {
        let start = self.pos;
        let in_calc = self.in_calc();
        let balanced = !self.stack.is_empty();
        let mut next = start;
        loop {
            if self.bytes[next] == BACKSLASH {
                next += 1;
            }
            next += 1;
            let Some(code) = self.peek(next) else {
                break;
            };
            let stop = is_blank(code)
                || matches!(code, SINGLE_QUOTE | DOUBLE_QUOTE | COMMA | COLON | SLASH | LEFT_PAREN)
                || (code == ASTERISK && in_calc)
                || (code == RIGHT_PAREN && balanced);
            if stop {
                break;
            }
        }
        let next = next.min(self.bytes.len());
        // A backslash may have skipped into a multi-byte character
        let next = (next..=self.bytes.len())
            .find(|&i| self.input.is_char_boundary(i))
            .unwrap_or(self.bytes.len());

        let token = CompactString::from(&self.input[start..next]);
        self.pos = next;
        if self.peek(next) == Some(LEFT_PAREN) {
            self.name = token;
        } else {
            self.tokens.push(ValueNode::Word { value: token });
        }
    }
}
