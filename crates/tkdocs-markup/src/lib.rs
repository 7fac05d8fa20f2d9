//! Lexer, parser, and document tree for the **TkinDocs** markup language
//! (`.tkd`).
//!
//! This crate knows nothing about widgets or toolkits; it turns text into a
//! [`Document`] and back. Widget and option names are not checked here, so
//! one document can be built against different registries without
//! re-parsing.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ast`] | `Document`, `Node`, `Opt`, `SourceMeta` |
//! | [`error`] | `LexError`, `ParseError`, `SyntaxError`, `SourcePos` |
//! | [`lexer`] | `Lexer`, `Token`, `TokenKind` |
//! | [`literal`] | `Literal`: the shape of a raw option value |
//! | [`parser`] | `parse_str` / `parse_document` entry points |
//! | [`render`] | canonical re-serialization |
//!
//! # Format
//!
//! ```tkd
//! // one widget per line; children are indented with spaces
//! Window title="Hello" key=main
//!     Frame layout=grid row=0 column=0
//!         Label text="Name:"
//!         Entry textvariable=name
//!     Button label="Click" onClick=doThing
//!     Combo values={small:medium:large}
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use tkdocs_markup::parse_str;
//!
//! let doc = parse_str("Window title=\"Hello\"\n    Button label=Click\n").unwrap();
//! assert_eq!(doc.root.widget, "Window");
//! assert_eq!(doc.root.children[0].raw("label"), Some("Click"));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod render;

pub use ast::{Document, Node, Opt, SourceMeta};
pub use error::{LexError, ParseError, SourcePos, SyntaxError};
pub use lexer::{Lexer, Token, TokenKind};
pub use literal::Literal;
pub use parser::{parse_document, parse_str};
pub use render::{render, render_with, RenderConfig};

#[cfg(test)]
mod parse_tests {
    use super::*;

    fn ok(src: &str) { parse_str(src).unwrap(); }
    fn lex_err(src: &str) { assert!(matches!(parse_str(src), Err(SyntaxError::Lex(_))), "{src:?}"); }
    fn parse_err(src: &str) { assert!(matches!(parse_str(src), Err(SyntaxError::Parse(_))), "{src:?}"); }

    #[test] fn bare_root() { ok("Window"); }
    #[test] fn root_with_options() { ok(r#"Window title="Hello" geometry=400x300"#); }
    #[test] fn nested() {
        ok("Window\n    Frame\n        Label text=a\n        Label text=b\n    Button label=Go\n");
    }
    #[test] fn deep_dedent() {
        ok("Window\n  Frame\n    Frame\n      Label\n  Button\n");
    }
    #[test] fn uneven_but_consistent_levels() {
        ok("Window\n  Frame\n       Label\n  Button\n");
    }
    #[test] fn line_comment() { ok("// header\nWindow // root\n    // inside\n    Button\n"); }
    #[test] fn quoted_escapes() { ok(r#"Label text="say \"hi\"\n""#); }
    #[test] fn reference_value() { ok("Window key=main\n    Button target=@main\n"); }
    #[test] fn list_value() { ok(r#"Combo values={a:"b c":d}"#); }
    #[test] fn dotted_widget_name() { ok("ttk.Combobox values={x:y}"); }
    #[test] fn dotted_callback() { ok("Button onClick=app.quit"); }
    #[test] fn color_value() { ok("Label bg=#ff0000 fg=#fff"); }
    #[test] fn negative_number() { ok("Scale from=-10 to=10"); }
    #[test] fn spec_example() {
        ok("Window title=\"Hello\"\n    Button label=\"Click\" onClick=doThing\n");
    }

    #[test] fn err_mismatched_dedent() { lex_err("Window\n    Frame\n  Label\n"); }
    #[test] fn err_tab_indent() { lex_err("Window\n\tLabel\n"); }
    #[test] fn err_unclosed_string() { lex_err(r#"Label text="oops"#); }
    #[test] fn err_unclosed_list() { lex_err("Combo values={a:b"); }
    #[test] fn err_missing_value() { lex_err("Label text="); }
    #[test] fn err_duplicate_key() { parse_err("Label text=a text=b"); }
    #[test] fn err_missing_delimiter() { parse_err("Label text hello"); }
    #[test] fn err_empty_widget_name() { parse_err("text=hi"); }
    #[test] fn err_two_roots() { parse_err("Window\nWindow\n"); }
    #[test] fn err_empty() { parse_err(""); }
}
