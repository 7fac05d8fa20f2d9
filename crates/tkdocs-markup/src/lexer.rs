use std::collections::VecDeque;

use crate::error::LexError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Deeper indentation than the enclosing line: opens a child block.
    Indent,
    /// Closes one open indentation level.
    Dedent,
    /// Widget type name (or any bare word not followed by `=`).
    Ident,
    /// The `key` in `key=value`.
    OptionKey,
    /// Raw source text of the value in `key=value`, quotes included.
    OptionValue,
    /// Only produced when comment retention is enabled.
    Comment,
    EndOfLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub col: usize,
}

// ── Character classes ─────────────────────────────────────────────────────

pub(crate) fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// A valid widget type name: what the lexer accepts as the first word of a line.
pub fn is_widget_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if is_word_start(c)) && chars.all(is_word_char)
}

/// A valid option key: like a widget name, minus `.`.
pub fn is_option_key(s: &str) -> bool {
    is_widget_name(s) && !s.contains('.')
}

// ── Line cursor ───────────────────────────────────────────────────────────

struct Cursor<'s> {
    text: &'s str,
    pos: usize,
    line: usize,
}

impl<'s> Cursor<'s> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.text[self.pos..].starts_with(pat)
    }

    fn col(&self) -> usize {
        self.text[..self.pos].chars().count() + 1
    }

    /// Skip spaces and tabs; returns whether anything was skipped.
    fn skip_blanks(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
        self.pos != start
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.advance();
        }
        &self.text[start..self.pos]
    }

    fn err(&self, msg: impl Into<String>) -> LexError {
        LexError::new(msg, self.line, self.col())
    }

    /// Scan a `"..."` literal starting at the opening quote.
    fn scan_quoted(&mut self) -> Result<(), LexError> {
        let open = self.col();
        self.advance(); // consume opening `"`
        loop {
            match self.advance() {
                None => return Err(LexError::new("unterminated string literal", self.line, open)),
                Some('"') => return Ok(()),
                Some('\\') => {
                    let esc_col = self.col();
                    match self.advance() {
                        Some('n' | 't' | '"' | '\\') => {}
                        Some(c) => {
                            return Err(LexError::new(
                                format!("unknown escape sequence \\{c}"),
                                self.line,
                                esc_col,
                            ));
                        }
                        None => return Err(LexError::new("unterminated escape sequence", self.line, open)),
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Scan a `{a:b:c}` list starting at the opening brace.
    fn scan_list(&mut self) -> Result<(), LexError> {
        let open = self.col();
        self.advance(); // consume `{`
        loop {
            match self.peek() {
                None => return Err(LexError::new("unterminated list, expected '}'", self.line, open)),
                Some('}') => {
                    self.advance();
                    return Ok(());
                }
                Some('"') => self.scan_quoted()?,
                Some('{') => return Err(self.err("nested lists are not supported")),
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

// ── Lexer ─────────────────────────────────────────────────────────────────

/// Lazy tokenizer for `.tkd` source.
///
/// Iterating yields tokens one line at a time. The lexer is `Clone`, so a
/// fresh copy taken before iteration replays the same sequence; [`restart`]
/// rewinds an exhausted one in place.
///
/// [`restart`]: Lexer::restart
#[derive(Debug, Clone)]
pub struct Lexer<'s> {
    src: &'s str,
    rest: &'s str,
    line: usize,
    /// Widths of the open indentation levels; the bottom entry is always 0.
    indents: Vec<usize>,
    pending: VecDeque<Token>,
    keep_comments: bool,
    done: bool,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self {
            src,
            rest: src,
            line: 0,
            indents: vec![0],
            pending: VecDeque::new(),
            keep_comments: false,
            done: false,
        }
    }

    /// Emit [`TokenKind::Comment`] tokens instead of discarding comments.
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }

    pub fn restart(&mut self) {
        *self = Self::new(self.src).keep_comments(self.keep_comments);
    }

    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }

    fn push(&mut self, kind: TokenKind, lexeme: &str, col: usize) {
        self.pending.push_back(Token { kind, lexeme: lexeme.to_string(), line: self.line, col });
    }

    fn next_line(&mut self) -> Option<&'s str> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.find('\n') {
            Some(i) => (&self.rest[..i], &self.rest[i + 1..]),
            None => (self.rest, ""),
        };
        self.rest = rest;
        self.line += 1;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    fn lex_line(&mut self, text: &'s str) -> Result<(), LexError> {
        let body = text.trim_start_matches([' ', '\t']);
        let indent = text.len() - body.len();

        // Blank and comment-only lines never touch the indentation stack.
        if body.is_empty() {
            return Ok(());
        }
        if body.starts_with("//") {
            if self.keep_comments {
                self.push(TokenKind::Comment, body, indent + 1);
            }
            return Ok(());
        }
        if let Some(tab) = text[..indent].find('\t') {
            return Err(LexError::new(
                "tab character in indentation, indent with spaces",
                self.line,
                tab + 1,
            ));
        }

        self.lex_indentation(indent)?;

        let mut cur = Cursor { text, pos: indent, line: self.line };
        let mut separated = true;
        loop {
            match cur.peek() {
                None => break,
                Some('/') if separated && cur.starts_with("//") => {
                    if self.keep_comments {
                        let col = cur.col();
                        self.push(TokenKind::Comment, &text[cur.pos..], col);
                    }
                    cur.pos = text.len();
                    break;
                }
                Some(_) if !separated => {
                    return Err(cur.err("expected whitespace between tokens"));
                }
                Some(c) if is_word_start(c) => self.lex_word(&mut cur)?,
                Some(c) => return Err(cur.err(format!("unexpected character {c:?}"))),
            }
            separated = cur.skip_blanks();
        }

        let col = cur.col();
        self.push(TokenKind::EndOfLine, "", col);
        Ok(())
    }

    fn lex_indentation(&mut self, width: usize) -> Result<(), LexError> {
        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            self.indents.push(width);
            self.push(TokenKind::Indent, "", 1);
        } else if width < top {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.push(TokenKind::Dedent, "", 1);
            }
            if self.indents.last() != Some(&width) {
                return Err(LexError::new(
                    format!(
                        "dedent to column {} does not match any open indentation level",
                        width + 1
                    ),
                    self.line,
                    width + 1,
                ));
            }
        }
        Ok(())
    }

    /// A word followed by `=` is an option key (and pulls its value along);
    /// anything else is an identifier.
    fn lex_word(&mut self, cur: &mut Cursor<'s>) -> Result<(), LexError> {
        let col = cur.col();
        let word = cur.take_while(is_word_char);
        let after_word = cur.pos;
        cur.skip_blanks();
        if cur.peek() != Some('=') {
            cur.pos = after_word;
            self.push(TokenKind::Ident, word, col);
            return Ok(());
        }
        if !is_option_key(word) {
            return Err(LexError::new(format!("invalid option key {word:?}"), self.line, col));
        }
        self.push(TokenKind::OptionKey, word, col);
        cur.advance(); // consume `=`
        let spaced = cur.skip_blanks();
        self.lex_value(cur, word, spaced)
    }

    fn lex_value(&mut self, cur: &mut Cursor<'s>, key: &str, spaced: bool) -> Result<(), LexError> {
        let col = cur.col();
        let start = cur.pos;
        match cur.peek() {
            None => return Err(cur.err(format!("missing value for option {key:?}"))),
            Some('/') if spaced && cur.starts_with("//") => {
                return Err(cur.err(format!("missing value for option {key:?}")));
            }
            Some('"') => cur.scan_quoted()?,
            Some('{') => cur.scan_list()?,
            Some(_) => {
                let bare = cur.take_while(|c| !c.is_whitespace());
                if let Some(bad) = bare.chars().find(|c| matches!(c, '"' | '{' | '}')) {
                    return Err(LexError::new(
                        format!("unexpected {bad:?} in unquoted value {bare:?}"),
                        self.line,
                        col,
                    ));
                }
            }
        }
        let raw = &cur.text[start..cur.pos];
        self.push(TokenKind::OptionValue, raw, col);
        Ok(())
    }

    fn close_open_levels(&mut self) {
        let line = self.line + 1;
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token { kind: TokenKind::Dedent, lexeme: String::new(), line, col: 1 });
        }
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.pop_front() {
                return Some(Ok(tok));
            }
            if self.done {
                return None;
            }
            match self.next_line() {
                Some(text) => {
                    if let Err(e) = self.lex_line(text) {
                        self.pending.clear();
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                None => {
                    self.close_open_levels();
                    self.done = true;
                }
            }
        }
    }
}
