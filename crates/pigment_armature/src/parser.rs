//! Stylesheet parser.
//!
//! Builds a [`Root`] from the token list, recording the whitespace and punctuation
//! around every node so that `stringify(parse(text)) == text`.

use pigment_carton::SmallVec;
use pigment_relief::ast::*;
use pigment_relief::{ErrorCode, ParseError};

use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// Parse stylesheet source into a tree
pub fn parse(source: &str) -> Result<Root, ParseError> {
    Parser::new(source).parse()
}

/// A block whose closing `}` has not been seen yet
#[derive(Debug)]
enum OpenBlock {
    Rule(Rule),
    AtRule(AtRule),
}

impl OpenBlock {
    fn nodes_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Self::Rule(rule) => &mut rule.nodes,
            Self::AtRule(at_rule) => at_rule.nodes.get_or_insert_with(Vec::new),
        }
    }

    fn start(&self) -> Position {
        match self {
            Self::Rule(rule) => rule.loc.start,
            Self::AtRule(at_rule) => at_rule.loc.start,
        }
    }
}

/// Parser context for building the tree
pub struct Parser<'a> {
    source: &'a str,
    tokenizer: Tokenizer<'a>,
    tokens: Vec<Token>,
    cursor: usize,
    root: Root,
    stack: Vec<OpenBlock>,
    /// Whitespace waiting to become the next node's `before` (or a block's `after`)
    spaces: String,
    /// Whether the last node of the current block ended with `;`
    semicolon: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokenizer: Tokenizer::new(source),
            tokens: Vec::new(),
            cursor: 0,
            root: Root::new(),
            stack: Vec::new(),
            spaces: String::new(),
            semicolon: false,
        }
    }

    pub fn parse(mut self) -> Result<Root, ParseError> {
        self.tokens = self.tokenizer.tokenize()?;

        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Space => self.spaces.push_str(self.text(token)),
                TokenKind::Semicolon => self.free_semicolon(),
                TokenKind::CloseCurly => self.end(token)?,
                TokenKind::Comment => self.comment(token),
                TokenKind::AtWord => self.at_rule(token)?,
                TokenKind::OpenCurly => self.empty_rule(token),
                _ => self.other(token)?,
            }
        }

        self.end_file()
    }

    #[inline]
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).copied();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    /// Return the most recently read token to the stream
    #[inline]
    fn back(&mut self) {
        self.cursor -= 1;
    }

    #[inline]
    fn end_of_file(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    #[inline]
    fn text(&self, token: Token) -> &'a str {
        &self.source[token.start..token.end]
    }

    fn join(&self, tokens: &[Token]) -> String {
        tokens.iter().map(|&t| self.text(t)).collect()
    }

    fn loc(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(self.tokenizer.get_pos(start), self.tokenizer.get_pos(end))
    }

    fn current_nodes(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(block) => block.nodes_mut(),
            None => &mut self.root.nodes,
        }
    }

    /// Append a finished node to the current block
    fn push(&mut self, node: Node) {
        self.current_nodes().push(node);
    }

    fn take_spaces(&mut self) -> String {
        std::mem::take(&mut self.spaces)
    }

    fn free_semicolon(&mut self) {
        self.spaces.push(';');
        let spaces = self.spaces.clone();
        let mut attached = false;
        if let Some(Node::Rule(rule)) = self.current_nodes().last_mut() {
            if rule.raws.own_semicolon.is_none() {
                rule.raws.own_semicolon = Some(spaces);
                attached = true;
            }
        }
        if attached {
            self.spaces.clear();
        }
    }

    fn end(&mut self, token: Token) -> Result<(), ParseError> {
        let Some(mut block) = self.stack.pop() else {
            return Err(ParseError::new(
                ErrorCode::UnexpectedCloseBrace,
                self.tokenizer.get_pos(token.start),
            ));
        };

        let semicolon = std::mem::take(&mut self.semicolon);
        let after = self.take_spaces();
        let end = self.tokenizer.get_pos(token.end);
        let node = match &mut block {
            OpenBlock::Rule(rule) => {
                if !rule.nodes.is_empty() {
                    rule.raws.semicolon = Some(semicolon);
                }
                rule.raws.after = Some(after);
                rule.loc.end = end;
                Node::Rule(std::mem::take(rule))
            }
            OpenBlock::AtRule(at_rule) => {
                if at_rule.nodes.as_ref().is_some_and(|n| !n.is_empty()) {
                    at_rule.raws.semicolon = Some(semicolon);
                }
                at_rule.raws.after = Some(after);
                at_rule.loc.end = end;
                Node::AtRule(std::mem::take(at_rule))
            }
        };
        self.push(node);
        Ok(())
    }

    fn end_file(mut self) -> Result<Root, ParseError> {
        if let Some(block) = self.stack.last() {
            return Err(ParseError::new(ErrorCode::UnclosedBlock, block.start()));
        }
        if !self.root.nodes.is_empty() {
            self.root.raws.semicolon = Some(self.semicolon);
        }
        self.root.raws.after = std::mem::take(&mut self.spaces);
        Ok(self.root)
    }

    fn comment(&mut self, token: Token) {
        let inner = &self.source[token.start + 2..token.end - 2];
        let mut comment = Comment::default();
        comment.raws.before = Some(self.take_spaces());
        comment.loc = self.loc(token.start, token.end);

        if inner.trim().is_empty() {
            comment.raws.left = Some(inner.to_owned());
            comment.raws.right = Some(String::new());
        } else {
            let text = inner.trim();
            let left_len = inner.len() - inner.trim_start().len();
            comment.raws.left = Some(inner[..left_len].to_owned());
            comment.raws.right = Some(inner[left_len + text.len()..].to_owned());
            comment.text = text.to_owned();
        }
        self.push(comment.into());
    }

    fn empty_rule(&mut self, token: Token) {
        let mut rule = Rule::default();
        rule.raws.before = Some(self.take_spaces());
        rule.raws.between = Some(String::new());
        rule.loc = self.loc(token.start, token.end);
        self.semicolon = false;
        self.stack.push(OpenBlock::Rule(rule));
    }

    /// Anything that is not an at-rule or comment: a rule or a declaration
    fn other(&mut self, start: Token) -> Result<(), ParseError> {
        let custom_property = self.text(start).starts_with("--");
        let mut end = false;
        let mut colon = false;
        let mut bracket: Option<Token> = None;
        let mut brackets: SmallVec<[TokenKind; 4]> = SmallVec::new();
        let mut tokens: Vec<Token> = Vec::new();

        let mut current = Some(start);
        while let Some(token) = current {
            tokens.push(token);
            match token.kind {
                TokenKind::OpenParen | TokenKind::OpenSquare => {
                    bracket.get_or_insert(token);
                    brackets.push(if token.kind == TokenKind::OpenParen {
                        TokenKind::CloseParen
                    } else {
                        TokenKind::CloseSquare
                    });
                }
                TokenKind::OpenCurly if custom_property && colon => {
                    bracket.get_or_insert(token);
                    brackets.push(TokenKind::CloseCurly);
                }
                kind if brackets.is_empty() => match kind {
                    TokenKind::Semicolon => {
                        if colon {
                            return self.decl(tokens, custom_property);
                        }
                        break;
                    }
                    TokenKind::OpenCurly => {
                        self.rule(tokens);
                        return Ok(());
                    }
                    TokenKind::CloseCurly => {
                        self.back();
                        tokens.pop();
                        end = true;
                        break;
                    }
                    TokenKind::Colon => colon = true,
                    _ => {}
                },
                kind if brackets.last() == Some(&kind) => {
                    brackets.pop();
                    if brackets.is_empty() {
                        bracket = None;
                    }
                }
                _ => {}
            }
            current = self.next();
        }

        if self.end_of_file() {
            end = true;
        }
        if let Some(bracket) = bracket {
            return Err(ParseError::new(
                ErrorCode::UnclosedBracket,
                self.tokenizer.get_pos(bracket.start),
            ));
        }

        if end && colon {
            if !custom_property {
                while tokens.last().is_some_and(Token::is_space_or_comment) {
                    tokens.pop();
                    self.back();
                }
            }
            return self.decl(tokens, custom_property);
        }
        Err(self.unknown_word(&tokens))
    }

    fn unknown_word(&self, tokens: &[Token]) -> ParseError {
        let token = tokens
            .iter()
            .find(|t| !t.is_space_or_comment())
            .or(tokens.first());
        match token {
            Some(&token) => ParseError::new(ErrorCode::UnknownWord, self.tokenizer.get_pos(token.start))
                .with_detail(self.text(token)),
            None => ParseError::new(ErrorCode::UnknownWord, self.tokenizer.get_pos(self.source.len())),
        }
    }

    fn rule(&mut self, mut tokens: Vec<Token>) {
        let open = tokens.pop();
        let mut rule = Rule::default();
        rule.raws.before = Some(self.take_spaces());
        rule.raws.between = Some(spaces_and_comments_from_end(self, &mut tokens));
        rule.selector = self.join(&tokens);

        let start = tokens.first().or(open.as_ref()).map_or(0, |t| t.start);
        let end = open.map_or(start, |t| t.end);
        rule.loc = self.loc(start, end);

        self.semicolon = false;
        self.stack.push(OpenBlock::Rule(rule));
    }

    fn decl(&mut self, mut tokens: Vec<Token>, custom_property: bool) -> Result<(), ParseError> {
        let mut decl = Declaration::default();
        let mut before = self.take_spaces();
        self.semicolon = false;

        let last = tokens.last().copied();
        if last.is_some_and(|t| t.kind == TokenKind::Semicolon) {
            self.semicolon = true;
            tokens.pop();
        }

        let mut rest = tokens.as_slice();
        while let Some((first, tail)) = rest.split_first() {
            if first.kind == TokenKind::Word {
                break;
            }
            before.push_str(self.text(*first));
            rest = tail;
        }

        let start = rest.first().map_or(0, |t| t.start);
        let end = last.map_or(start, |t| t.end);
        decl.loc = self.loc(start, end);

        let mut prop = String::new();
        while let Some((first, tail)) = rest.split_first() {
            if matches!(
                first.kind,
                TokenKind::Colon | TokenKind::Space | TokenKind::Comment
            ) {
                break;
            }
            prop.push_str(self.text(*first));
            rest = tail;
        }

        let mut between = String::new();
        while let Some((first, tail)) = rest.split_first() {
            rest = tail;
            if first.kind == TokenKind::Colon {
                between.push(':');
                break;
            }
            let text = self.text(*first);
            if first.kind == TokenKind::Word && text.bytes().any(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Err(self.unknown_word(&[*first]));
            }
            between.push_str(text);
        }

        let mut first_spaces = Vec::new();
        while let Some((first, tail)) = rest.split_first() {
            if !first.is_space_or_comment() {
                break;
            }
            first_spaces.push(*first);
            rest = tail;
        }

        let mut value_tokens = rest.to_vec();
        self.important(&mut decl, &mut value_tokens);

        if value_tokens.iter().any(|t| !t.is_space_or_comment()) {
            between.push_str(&self.join(&first_spaces));
            first_spaces.clear();
        }
        first_spaces.extend(value_tokens);

        let (value, raw) = self.raw_value(&first_spaces, custom_property);
        if let Some(raw) = raw {
            decl.raws.value = Some(RawValue {
                value: value.clone(),
                raw,
            });
        }

        decl.prop = prop.into();
        decl.value = value;
        decl.raws.before = Some(before);
        decl.raws.between = Some(between);
        self.push(decl.into());
        Ok(())
    }

    /// Move a trailing `!important` (and the whitespace around it) out of the value
    fn important(&self, decl: &mut Declaration, tokens: &mut Vec<Token>) {
        for index in (0..tokens.len()).rev() {
            let token = tokens[index];
            if self.text(token).eq_ignore_ascii_case("!important") {
                decl.important = true;
                let mut important = self.join(&tokens[index..]);
                tokens.truncate(index);
                let mut spaces = String::new();
                while tokens.last().is_some_and(|t| t.kind == TokenKind::Space) {
                    if let Some(space) = tokens.pop() {
                        spaces.insert_str(0, self.text(space));
                    }
                }
                important.insert_str(0, &spaces);
                if important != " !important" {
                    decl.raws.important = Some(important);
                }
                break;
            }
            if !token.is_space_or_comment() {
                break;
            }
        }
    }

    /// Clean value text plus the raw text when they differ.
    ///
    /// Comments next to whitespace and a trailing space are left out of the clean value.
    fn raw_value(&self, tokens: &[Token], custom_property: bool) -> (String, Option<String>) {
        let mut value = String::new();
        let mut clean = true;
        for (i, &token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Space if i == tokens.len() - 1 && !custom_property => clean = false,
                TokenKind::Comment => {
                    let safe = |t: Option<&Token>| t.map_or(true, |t| t.kind == TokenKind::Space);
                    let prev = i.checked_sub(1).and_then(|p| tokens.get(p));
                    if !safe(prev) && !safe(tokens.get(i + 1)) {
                        if value.ends_with(',') {
                            clean = false;
                        } else {
                            value.push_str(self.text(token));
                        }
                    } else {
                        clean = false;
                    }
                }
                _ => value.push_str(self.text(token)),
            }
        }
        if clean {
            (value, None)
        } else {
            let raw = self.join(tokens);
            (value, Some(raw))
        }
    }

    fn at_rule(&mut self, token: Token) -> Result<(), ParseError> {
        let name = &self.source[token.start + 1..token.end];
        if name.is_empty() {
            return Err(ParseError::new(ErrorCode::UnknownWord, self.tokenizer.get_pos(token.start))
                .with_detail("@"));
        }

        let mut at_rule = AtRule::new(name, String::new());
        at_rule.raws.before = Some(self.take_spaces());
        self.semicolon = false;

        let mut params: Vec<Token> = Vec::new();
        let mut brackets: SmallVec<[TokenKind; 4]> = SmallVec::new();
        let mut open = false;
        let mut last = false;
        let mut close_parent: Option<Token> = None;
        let mut end = token.end;

        loop {
            let Some(current) = self.next() else {
                last = true;
                break;
            };

            match current.kind {
                TokenKind::OpenParen => brackets.push(TokenKind::CloseParen),
                TokenKind::OpenSquare => brackets.push(TokenKind::CloseSquare),
                TokenKind::OpenCurly if !brackets.is_empty() => brackets.push(TokenKind::CloseCurly),
                kind if brackets.last() == Some(&kind) => {
                    brackets.pop();
                }
                _ => {}
            }

            if brackets.is_empty() {
                match current.kind {
                    TokenKind::Semicolon => {
                        end = current.end;
                        self.semicolon = true;
                        break;
                    }
                    TokenKind::OpenCurly => {
                        open = true;
                        end = current.end;
                        break;
                    }
                    TokenKind::CloseCurly => {
                        if let Some(last_param) = params.iter().rev().find(|t| t.kind != TokenKind::Space) {
                            end = last_param.end;
                        }
                        close_parent = Some(current);
                        break;
                    }
                    _ => params.push(current),
                }
            } else {
                params.push(current);
            }
        }

        at_rule.raws.between = Some(spaces_and_comments_from_end(self, &mut params));
        if params.is_empty() {
            at_rule.raws.after_name = Some(String::new());
        } else {
            at_rule.raws.after_name = Some(spaces_and_comments_from_start(self, &mut params));
            at_rule.params = self.join(&params);
            if last {
                if let Some(last_param) = params.last() {
                    end = last_param.end;
                }
                if let Some(between) = at_rule.raws.between.take() {
                    self.spaces = between;
                }
                at_rule.raws.between = Some(String::new());
            }
        }
        at_rule.loc = self.loc(token.start, end);

        if open {
            at_rule.nodes = Some(Vec::new());
            self.stack.push(OpenBlock::AtRule(at_rule));
            return Ok(());
        }

        self.push(at_rule.into());
        if let Some(close) = close_parent {
            self.end(close)?;
        }
        Ok(())
    }
}

fn spaces_and_comments_from_end(parser: &Parser<'_>, tokens: &mut Vec<Token>) -> String {
    let mut spaces = String::new();
    while tokens.last().is_some_and(Token::is_space_or_comment) {
        if let Some(token) = tokens.pop() {
            spaces.insert_str(0, parser.text(token));
        }
    }
    spaces
}

fn spaces_and_comments_from_start(parser: &Parser<'_>, tokens: &mut Vec<Token>) -> String {
    let count = tokens.iter().take_while(|t| t.is_space_or_comment()).count();
    let spaces = parser.join(&tokens[..count]);
    tokens.drain(..count);
    spaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigment_relief::stringify;

    fn round_trip(source: &str) {
        let root = parse(source).unwrap();
        assert_eq!(stringify(&root), source, "round trip of {source:?}");
    }

    #[test]
    fn test_round_trip() {
        round_trip("");
        round_trip("   \n");
        round_trip(".a { color: red; }");
        round_trip(".a{color:red}");
        round_trip("a {\n  color : red ;\n  margin:0 auto\n}\n\n.b { }\n");
        round_trip("@value red: blue;\n@value a, b as c from \"./x.css\";\n");
        round_trip("@value (\n  blue,\n  red\n) from \"./colors.css\";");
        round_trip("@media (max-width: 599px) {\n  .a { color: red }\n}");
        round_trip("@import url(foo.css) screen;");
        round_trip("/* head */\n.a { /* inside */ color: red /* tail */; }");
        round_trip(".a { color: red !important; top: 0 ! important }");
        round_trip(".a { color: red!IMPORTANT }");
        round_trip(".a {} ;\n.b {}");
        round_trip(":import('./colors.css') {\n  __value__red__0: red\n}\n:export {\n  red: __value__red__0\n}");
        round_trip(".a { --custom: { a: b }; --empty:; }");
        round_trip(".a { background: url(data:image/png;base64,AAA=) }");
        round_trip("a { *zoom: 1; _height: 1px }");
        round_trip("@value coolShadow: 0 11px 15px -7px rgba(0,0,0,.2)   ;");
        round_trip("@charset \"utf-8\"");
        round_trip(".a { @apply foo }");
    }

    #[test]
    fn test_rule_and_declaration() {
        let root = parse(".a  {\n  color : red ;\n}").unwrap();
        let Node::Rule(rule) = &root.nodes[0] else {
            panic!("expected rule");
        };
        assert_eq!(rule.selector, ".a");
        assert_eq!(rule.raws.between.as_deref(), Some("  "));
        assert_eq!(rule.raws.after.as_deref(), Some("\n"));
        assert_eq!(rule.raws.semicolon, Some(true));

        let Node::Declaration(decl) = &rule.nodes[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.prop, "color");
        assert_eq!(decl.value, "red");
        assert_eq!(decl.raws.before.as_deref(), Some("\n  "));
        assert_eq!(decl.raws.between.as_deref(), Some(" : "));
        assert_eq!(decl.raw_value(), "red ");
        assert_eq!(decl.loc.start.line, 2);
        assert_eq!(decl.loc.start.column, 3);
    }

    #[test]
    fn test_prop_keeps_leading_marker() {
        let root = parse(":import(colors) {\n  __value__a__0: a;\n  *zoom: 1\n}").unwrap();
        let props: Vec<_> = root.nodes[0]
            .nodes()
            .into_iter()
            .flatten()
            .filter_map(|node| match node {
                Node::Declaration(decl) => Some((decl.prop.as_str(), decl.raws.before.as_deref())),
                _ => None,
            })
            .collect();
        assert_eq!(
            props,
            [("__value__a__0", Some("\n  ")), ("*zoom", Some("\n  "))]
        );
    }

    #[test]
    fn test_at_rule_params() {
        let root = parse("@value  coolShadow: 0 1px rgba(0,0,0,.2)   ;").unwrap();
        let Node::AtRule(at_rule) = &root.nodes[0] else {
            panic!("expected at-rule");
        };
        assert_eq!(at_rule.name, "value");
        assert_eq!(at_rule.params, "coolShadow: 0 1px rgba(0,0,0,.2)");
        assert_eq!(at_rule.raws.after_name.as_deref(), Some("  "));
        assert_eq!(at_rule.raws.between.as_deref(), Some("   "));
        assert!(at_rule.nodes.is_none());
    }

    #[test]
    fn test_missing_semicolon_joins_at_rules() {
        let root = parse("@value red blue\n@value green yellow").unwrap();
        assert_eq!(root.nodes.len(), 1);
        let Node::AtRule(at_rule) = &root.nodes[0] else {
            panic!("expected at-rule");
        };
        assert_eq!(at_rule.params, "red blue\n@value green yellow");
    }

    #[test]
    fn test_important() {
        let root = parse("a { color: red  !important }").unwrap();
        let decl = match root.nodes[0].nodes().and_then(|n| n.first()) {
            Some(Node::Declaration(decl)) => decl.clone(),
            other => panic!("expected declaration, got {other:?}"),
        };
        assert!(decl.important);
        assert_eq!(decl.value, "red");
        assert_eq!(decl.raws.important.as_deref(), Some("  !important"));
    }

    #[test]
    fn test_comment_raws() {
        let root = parse("/*  note */").unwrap();
        let Node::Comment(comment) = &root.nodes[0] else {
            panic!("expected comment");
        };
        assert_eq!(comment.text, "note");
        assert_eq!(comment.raws.left.as_deref(), Some("  "));
        assert_eq!(comment.raws.right.as_deref(), Some(" "));
    }

    #[test]
    fn test_errors() {
        let err = parse(".a { color: red").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnclosedBlock);
        assert_eq!((err.position.line, err.position.column), (1, 1));

        let err = parse(".a {}\n}").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedCloseBrace);
        assert_eq!((err.position.line, err.position.column), (2, 1));

        let err = parse(".a { red }").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownWord);
        assert_eq!(err.detail.as_deref(), Some("red"));

        let err = parse(".a { color: calc(1px }").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnclosedBracket);
    }
}
