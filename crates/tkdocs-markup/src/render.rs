use std::fmt::Write as _;

use crate::ast::{Document, Node};

/// Canonical output settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Spaces per nesting level. Never zero.
    pub indent: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

impl RenderConfig {
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = width.max(1);
        self
    }
}

/// Serialize a document back to `.tkd` source in canonical form.
///
/// One node per line, `key=value` with no spaces around `=`, raw values
/// written exactly as parsed, no comments, trailing newline.
pub fn render(doc: &Document) -> String {
    render_with(doc, &RenderConfig::default())
}

pub fn render_with(doc: &Document, config: &RenderConfig) -> String {
    let mut out = String::new();
    render_node(&mut out, &doc.root, 0, config.indent.max(1));
    out
}

fn render_node(out: &mut String, node: &Node, depth: usize, indent: usize) {
    out.extend(std::iter::repeat_n(' ', depth * indent));
    out.push_str(&node.widget);
    for opt in &node.options {
        let _ = write!(out, " {}={}", opt.key, opt.value);
    }
    out.push('\n');
    for child in &node.children {
        render_node(out, child, depth + 1, indent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    #[test]
    fn normalizes_spacing_and_comments() {
        let src = "Window   title = \"Hi\"   // main\n\n  Button label=Go\n  // spare\n  Label\n";
        let doc = parse_str(src).unwrap();
        assert_eq!(render(&doc), "Window title=\"Hi\"\n    Button label=Go\n    Label\n");
    }

    #[test]
    fn custom_indent() {
        let doc = parse_str("A\n    B\n        C\n").unwrap();
        assert_eq!(render_with(&doc, &RenderConfig::default().indent(2)), "A\n  B\n    C\n");
    }

    #[test]
    fn zero_indent_is_clamped() {
        let doc = parse_str("A\n    B\n").unwrap();
        assert_eq!(render_with(&doc, &RenderConfig::default().indent(0)), "A\n B\n");
    }

    mod round_trip {
        use proptest::prelude::*;

        use crate::ast::{Document, Node, Opt, SourceMeta};
        use crate::error::SourcePos;
        use crate::literal::escape;
        use crate::parser::parse_str;
        use crate::render::render;

        fn value() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-z0-9#._-]{1,8}",
                "\\PC{0,12}".prop_map(|s| escape(&s)),
                "[a-z]{1,6}".prop_map(|s| format!("@{s}")),
                proptest::collection::vec("[a-z0-9]{1,4}", 0..4).prop_map(|items| format!("{{{}}}", items.join(":"))),
            ]
        }

        fn options() -> impl Strategy<Value = Vec<Opt>> {
            proptest::collection::vec(("[a-z][a-z_]{0,5}", value()), 0..5).prop_map(|pairs| {
                let mut opts: Vec<Opt> = Vec::new();
                for (key, value) in pairs {
                    if opts.iter().all(|o| o.key != key) {
                        opts.push(Opt { key, value, pos: SourcePos::default() });
                    }
                }
                opts
            })
        }

        fn leaf() -> impl Strategy<Value = Node> {
            ("[A-Z][A-Za-z]{0,7}", options()).prop_map(|(widget, options)| Node {
                widget,
                options,
                children: Vec::new(),
                pos: SourcePos::default(),
            })
        }

        fn tree() -> impl Strategy<Value = Node> {
            leaf().prop_recursive(4, 32, 4, |inner| {
                (leaf(), proptest::collection::vec(inner, 0..4)).prop_map(|(mut node, children)| {
                    node.children = children;
                    node
                })
            })
        }

        proptest! {
            #[test]
            fn parse_of_render_is_identity(root in tree()) {
                let doc = Document { root, source: SourceMeta::default() };
                let text = render(&doc);
                let reparsed = parse_str(&text).unwrap();
                prop_assert!(doc.same_structure(&reparsed), "rendered:\n{}", text);
            }
        }
    }
}
