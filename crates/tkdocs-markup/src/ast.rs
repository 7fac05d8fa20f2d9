use crate::error::SourcePos;

// ── Opt ───────────────────────────────────────────────────────────────────

/// A single `key=value` option on a widget line.
///
/// `value` is the raw source text, quotes and braces included. Typing it is
/// the builder's job, since the expected kind depends on the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Opt {
    pub key: String,
    pub value: String,
    /// Position of the key.
    pub pos: SourcePos,
}

// ── Node ──────────────────────────────────────────────────────────────────

/// One widget declaration and its nested children.
///
/// ```tkd
/// Button label="Save" onClick=save key=save_button
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Widget type name as written: `"Window"`, `"Button"`.
    pub widget: String,
    /// Options in declaration order. Keys are unique within a node.
    pub options: Vec<Opt>,
    /// Child nodes in declaration order.
    pub children: Vec<Node>,
    /// Position of the widget name.
    pub pos: SourcePos,
}

impl Node {
    pub fn new(widget: impl Into<String>) -> Self {
        Self { widget: widget.into(), options: Vec::new(), children: Vec::new(), pos: SourcePos::default() }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(Opt { key: key.into(), value: value.into(), pos: SourcePos::default() });
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an option by key.
    pub fn option(&self, key: &str) -> Option<&Opt> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Raw value of an option.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.option(key).map(|o| o.value.as_str())
    }

    /// Pre-order traversal: this node, then each child subtree in order.
    pub fn walk(&self) -> impl Iterator<Item = &Node> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Equality on widget types, options and children, ignoring source positions.
    pub fn same_structure(&self, other: &Node) -> bool {
        self.widget == other.widget
            && self.options.len() == other.options.len()
            && self.options.iter().zip(&other.options).all(|(a, b)| a.key == b.key && a.value == b.value)
            && self.children.len() == other.children.len()
            && self.children.iter().zip(&other.children).all(|(a, b)| a.same_structure(b))
    }
}

// ── Document ──────────────────────────────────────────────────────────────

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    /// File path or other identity; `<string>` for inline sources.
    pub name: String,
    /// Caller-supplied revision, bumped on every re-parse of the same file.
    pub version: u32,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self { name: "<string>".to_string(), version: 0 }
    }
}

/// The top-level parse result for a `.tkd` source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Node,
    pub source: SourceMeta,
}

impl Document {
    pub fn same_structure(&self, other: &Document) -> bool {
        self.root.same_structure(&other.root)
    }

    pub fn node_count(&self) -> usize {
        self.root.walk().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new("Window")
            .with_option("title", "\"Hi\"")
            .with_child(Node::new("Frame").with_child(Node::new("Label")))
            .with_child(Node::new("Button"))
    }

    #[test]
    fn walk_is_preorder() {
        let root = sample();
        let names: Vec<_> = root.walk().map(|n| n.widget.as_str()).collect();
        assert_eq!(names, vec!["Window", "Frame", "Label", "Button"]);
    }

    #[test]
    fn depth_counts_levels() {
        assert_eq!(sample().depth(), 3);
        assert_eq!(Node::new("Window").depth(), 1);
    }

    #[test]
    fn structure_ignores_positions() {
        let a = sample();
        let mut b = sample();
        b.pos = SourcePos::new(9, 9);
        b.children[0].pos = SourcePos::new(3, 5);
        assert!(a.same_structure(&b));
    }

    #[test]
    fn structure_sees_option_order() {
        let a = Node::new("Label").with_option("a", "1").with_option("b", "2");
        let b = Node::new("Label").with_option("b", "2").with_option("a", "1");
        assert!(!a.same_structure(&b));
    }
}
