use crate::ast::{Document, Node, Opt, SourceMeta};
use crate::error::{ParseError, SourcePos, SyntaxError};
use crate::lexer::{Lexer, Token, TokenKind};

fn describe(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Indent => "indentation",
        TokenKind::Dedent => "end of block",
        TokenKind::Ident => "identifier",
        TokenKind::OptionKey => "option",
        TokenKind::OptionValue => "option value",
        TokenKind::Comment => "comment",
        TokenKind::EndOfLine => "end of line",
    }
}

// ── Parser ────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Comment tokens are dropped here; the grammar never sees them.
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens.into_iter().filter(|t| t.kind != TokenKind::Comment).collect();
        Self { tokens, pos: 0 }
    }

    fn current_pos(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .map(|t| (t.line, t.col))
            .or_else(|| self.tokens.last().map(|t| (t.line, t.col)))
            .unwrap_or((1, 1))
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let (line, col) = self.current_pos();
        ParseError::new(msg, line, col)
    }

    fn err_at(tok: &Token, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, tok.line, tok.col)
    }

    fn expect_any(&mut self, what: &str) -> Result<Token, ParseError> {
        match self.advance() {
            Some(tok) => Ok(tok),
            None => Err(self.err(format!("expected {what}, found end of input"))),
        }
    }

    // ── Document ──────────────────────────────────────────────────────────

    pub fn parse_document(&mut self, source: SourceMeta) -> Result<Document, ParseError> {
        let root = match self.peek_kind() {
            None => return Err(self.err("document has no root widget")),
            Some(TokenKind::Indent) => return Err(self.err("unexpected indentation before the root widget")),
            Some(_) => self.parse_node()?,
        };

        if let Some(tok) = self.tokens.get(self.pos) {
            return Err(Self::err_at(
                tok,
                format!("multiple root widgets: {:?} follows root {:?}", tok.lexeme, root.widget),
            ));
        }

        Ok(Document { root, source })
    }

    // ── Node ──────────────────────────────────────────────────────────────

    /// `Ident (OptionKey OptionValue)* EndOfLine (Indent node+ Dedent)?`
    fn parse_node(&mut self) -> Result<Node, ParseError> {
        let head = self.expect_any("a widget name")?;
        match head.kind {
            TokenKind::Ident => {}
            TokenKind::OptionKey => {
                return Err(Self::err_at(
                    &head,
                    format!("empty widget-type name: line starts with option {:?}", head.lexeme),
                ));
            }
            other => {
                return Err(Self::err_at(&head, format!("expected a widget name, found {}", describe(other))));
            }
        }

        let mut node = Node {
            widget: head.lexeme,
            options: Vec::new(),
            children: Vec::new(),
            pos: SourcePos::new(head.line, head.col),
        };

        loop {
            let tok = self.expect_any("end of line")?;
            match tok.kind {
                TokenKind::EndOfLine => break,
                TokenKind::OptionKey => {
                    let opt = self.parse_option(tok, &node)?;
                    node.options.push(opt);
                }
                TokenKind::Ident => {
                    return Err(Self::err_at(
                        &tok,
                        format!("expected option `key=value`, found bare word {:?}", tok.lexeme),
                    ));
                }
                other => {
                    return Err(Self::err_at(
                        &tok,
                        format!("unexpected {} in options of {:?}", describe(other), node.widget),
                    ));
                }
            }
        }

        if self.peek_kind() == Some(TokenKind::Indent) {
            self.advance(); // consume Indent
            loop {
                match self.peek_kind() {
                    Some(TokenKind::Dedent) => {
                        self.advance();
                        break;
                    }
                    None => return Err(self.err(format!("unclosed block under {:?}", node.widget))),
                    Some(_) => node.children.push(self.parse_node()?),
                }
            }
        }

        Ok(node)
    }

    // ── Option ────────────────────────────────────────────────────────────

    fn parse_option(&mut self, key: Token, node: &Node) -> Result<Opt, ParseError> {
        let value = match self.advance() {
            Some(tok) if tok.kind == TokenKind::OptionValue => tok.lexeme,
            Some(tok) => {
                return Err(Self::err_at(
                    &tok,
                    format!("expected a value for option {:?}, found {}", key.lexeme, describe(tok.kind)),
                ));
            }
            None => return Err(self.err(format!("expected a value for option {:?}", key.lexeme))),
        };

        if let Some(first) = node.option(&key.lexeme) {
            return Err(Self::err_at(
                &key,
                format!(
                    "duplicate option {:?} on {:?} (first declared at {})",
                    key.lexeme, node.widget, first.pos
                ),
            ));
        }

        Ok(Opt { key: key.lexeme, value, pos: SourcePos::new(key.line, key.col) })
    }
}

// ── Public parse entry points ─────────────────────────────────────────────

/// Parse `.tkd` source into a [`Document`] tagged with `name` and `version`.
pub fn parse_document(name: impl Into<String>, version: u32, src: &str) -> Result<Document, SyntaxError> {
    let source = SourceMeta { name: name.into(), version };
    let tokens = Lexer::new(src).tokenize()?;
    log::trace!("lexed {} tokens from {}", tokens.len(), source.name);
    let doc = Parser::new(tokens).parse_document(source)?;
    log::debug!(
        "parsed {} v{}: root {:?}, {} nodes",
        doc.source.name,
        doc.source.version,
        doc.root.widget,
        doc.node_count()
    );
    Ok(doc)
}

/// Parse a `.tkd` source string into a [`Document`].
pub fn parse_str(src: &str) -> Result<Document, SyntaxError> {
    let meta = SourceMeta::default();
    parse_document(meta.name, meta.version, src)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(src: &str) -> ParseError {
        match parse_str(src) {
            Err(SyntaxError::Parse(e)) => e,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn keeps_option_and_child_order() {
        let doc = parse_str("Window b=2 a=1\n    Label c=3\n    Button\n    Entry\n").unwrap();
        let keys: Vec<_> = doc.root.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        let kids: Vec<_> = doc.root.children.iter().map(|n| n.widget.as_str()).collect();
        assert_eq!(kids, vec!["Label", "Button", "Entry"]);
    }

    #[test]
    fn positions_recorded() {
        let doc = parse_str("Window\n    Button label=Go\n").unwrap();
        let button = &doc.root.children[0];
        assert_eq!(button.pos, SourcePos::new(2, 5));
        assert_eq!(button.options[0].pos, SourcePos::new(2, 12));
    }

    #[test]
    fn duplicate_key_points_at_second() {
        let e = parse_err("Label text=a width=2 text=b");
        assert_eq!((e.line, e.col), (1, 22));
        assert!(e.message.contains("duplicate option \"text\""));
    }

    #[test]
    fn same_key_on_different_nodes_is_fine() {
        parse_str("Frame text=a\n    Label text=b\n").unwrap();
    }

    #[test]
    fn bare_word_in_option_position() {
        let e = parse_err("Button label");
        assert_eq!(e.col, 8);
        assert!(e.message.contains("key=value"));
    }

    #[test]
    fn line_starting_with_option() {
        let e = parse_err("text=hello");
        assert!(e.message.contains("empty widget-type name"));
    }

    #[test]
    fn empty_document() {
        let e = parse_err("// nothing but a comment\n\n");
        assert!(e.message.contains("no root"));
    }

    #[test]
    fn multiple_roots() {
        let e = parse_err("Window\n    Label\nWindow\n");
        assert_eq!(e.line, 3);
    }

    #[test]
    fn indented_first_line() {
        parse_err("    Window\n");
    }

    #[test]
    fn lex_errors_pass_through() {
        assert!(matches!(parse_str("Window\n\tLabel"), Err(SyntaxError::Lex(_))));
    }

    #[test]
    fn metadata_attached() {
        let doc = parse_document("ui/main.tkd", 3, "Window").unwrap();
        assert_eq!(doc.source.name, "ui/main.tkd");
        assert_eq!(doc.source.version, 3);
    }
}
