//! Syntax of option values.
//!
//! The parser keeps option values as raw text. This module splits that text
//! into its syntactic shape without assigning a type; what a bare `12` means
//! is decided later against the option's registered kind.

/// The syntactic form of a raw option value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `"..."` with escapes already processed.
    Quoted(String),
    /// Unquoted word: `12`, `true`, `doThing`, `#ff0000`.
    Bare(String),
    /// `@identifier`: a reference to the node declared with `key=identifier`.
    Reference(String),
    /// `{a:b:"c d"}`.
    List(Vec<Literal>),
}

impl Literal {
    /// Classify raw value text as produced by the lexer.
    ///
    /// Returns `None` for text the lexer would never have produced (an
    /// unterminated quote or list).
    pub fn parse(raw: &str) -> Option<Literal> {
        if let Some(inner) = raw.strip_prefix('{') {
            let inner = inner.strip_suffix('}')?;
            let items = split_list(inner)?
                .iter()
                .map(|item| Literal::parse_item(item))
                .collect::<Option<Vec<_>>>()?;
            return Some(Literal::List(items));
        }
        Literal::parse_item(raw)
    }

    fn parse_item(raw: &str) -> Option<Literal> {
        if raw.starts_with('"') {
            return unescape(raw).map(Literal::Quoted);
        }
        if let Some(name) = raw.strip_prefix('@') {
            return Some(Literal::Reference(name.to_string()));
        }
        Some(Literal::Bare(raw.to_string()))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Literal::Quoted(_) => "quoted string",
            Literal::Bare(_) => "bare word",
            Literal::Reference(_) => "reference",
            Literal::List(_) => "list",
        }
    }
}

/// Strip the surrounding quotes from `"..."` and process escapes.
pub fn unescape(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if c == '"' {
                return None;
            }
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }
    Some(out)
}

/// Quote `s` so that [`unescape`] returns it unchanged.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Split list contents on `:` outside of quotes. `{}` is the empty list.
fn split_list(inner: &str) -> Option<Vec<String>> {
    if inner.is_empty() {
        return Some(Vec::new());
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quote => {
                current.push(c);
                current.push(chars.next()?);
            }
            '"' => {
                in_quote = !in_quote;
                current.push(c);
            }
            ':' if !in_quote => items.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    if in_quote {
        return None;
    }
    items.push(current.trim().to_string());
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(Literal::parse("12"), Some(Literal::Bare("12".into())));
        assert_eq!(Literal::parse(r#""a \"b\"""#), Some(Literal::Quoted("a \"b\"".into())));
        assert_eq!(Literal::parse("@main"), Some(Literal::Reference("main".into())));
    }

    #[test]
    fn list_items() {
        let lit = Literal::parse(r#"{red:"dark blue":@other}"#).unwrap();
        assert_eq!(
            lit,
            Literal::List(vec![
                Literal::Bare("red".into()),
                Literal::Quoted("dark blue".into()),
                Literal::Reference("other".into()),
            ])
        );
    }

    #[test]
    fn colon_inside_quoted_item() {
        let lit = Literal::parse(r#"{"a:b":c}"#).unwrap();
        assert_eq!(lit, Literal::List(vec![Literal::Quoted("a:b".into()), Literal::Bare("c".into())]));
    }

    #[test]
    fn empty_list() {
        assert_eq!(Literal::parse("{}"), Some(Literal::List(Vec::new())));
    }

    #[test]
    fn escapes_round_trip() {
        for s in ["plain", "tab\there", "quote\"d", "back\\slash", "line\nbreak", ""] {
            assert_eq!(unescape(&escape(s)).as_deref(), Some(s));
        }
    }

    #[test]
    fn malformed() {
        assert_eq!(Literal::parse("\"open"), None);
        assert_eq!(Literal::parse("{a:b"), None);
        assert_eq!(unescape(r#""bad \q""#), None);
    }
}
