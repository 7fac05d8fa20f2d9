use std::fmt;
use std::rc::Rc;

use tkdocs_markup::literal::escape;

use crate::toolkit::{VarKind, VariableHandle, WidgetHandle};

// ── Event / Callback ──────────────────────────────────────────────────────

/// What a callback is told when the toolkit fires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub widget: WidgetHandle,
    /// Toolkit event name, e.g. `"click"`.
    pub name: String,
}

/// A named external function attached to a widget event.
#[derive(Clone)]
pub struct Callback {
    name: String,
    func: Rc<dyn Fn(&Event)>,
}

impl Callback {
    pub fn new(name: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        Self { name: name.into(), func: Rc::new(f) }
    }

    /// The identifier this callback was bound under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, event: &Event) {
        (self.func)(event)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.name).finish()
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.func, &other.func)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

/// A typed option value, ready for a setter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    /// A resolved `@identifier` reference.
    Widget(WidgetHandle),
    /// A shared toolkit variable.
    Variable(VariableHandle),
    Callback(Callback),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_widget(&self) -> Option<WidgetHandle> {
        match self {
            Value::Widget(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Widget(_) => "widget",
            Value::Variable(_) => "variable",
            Value::Callback(_) => "callback",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(&escape(s)),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Value::Widget(h) => write!(f, "{h}"),
            Value::Variable(v) => write!(f, "{v}"),
            Value::Callback(cb) => f.write_str(cb.name()),
        }
    }
}

// ── ValueKind ─────────────────────────────────────────────────────────────

/// The type a setter expects; drives how raw option text is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// Quoted string, or a bare word taken verbatim.
    Str,
    Int,
    Float,
    /// `true` or `false`, nothing else.
    Bool,
    /// `@identifier` naming a node declared with `key=identifier`.
    Reference,
    /// Identifier looked up in the callback bindings.
    Callback,
    /// Identifier naming a shared toolkit variable, created on first use.
    Variable(VarKind),
    /// `{a:b:c}` with every item of the inner kind.
    List(Box<ValueKind>),
    /// Inferred from the literal's shape.
    Any,
}

impl ValueKind {
    pub fn list_of(inner: ValueKind) -> Self {
        ValueKind::List(Box::new(inner))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Str => f.write_str("a string"),
            ValueKind::Int => f.write_str("an integer"),
            ValueKind::Float => f.write_str("a number"),
            ValueKind::Bool => f.write_str("`true` or `false`"),
            ValueKind::Reference => f.write_str("a widget reference (@identifier)"),
            ValueKind::Callback => f.write_str("a callback identifier"),
            ValueKind::Variable(kind) => write!(f, "a {kind} variable name"),
            ValueKind::List(inner) => write!(f, "a list of {inner}"),
            ValueKind::Any => f.write_str("a value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Value::Str("a \"b\"".into()).to_string(), r#""a \"b\"""#);
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Str("x".into())]).to_string(),
            r#"{1:"x"}"#
        );
        assert_eq!(Value::Widget(WidgetHandle(4)).to_string(), "#4");
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Str("3".into()).as_float(), None);
    }

    #[test]
    fn callback_equality_is_identity() {
        let a = Callback::new("go", |_| {});
        let b = Callback::new("go", |_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn callback_receives_event() {
        let hits = std::rc::Rc::new(Cell::new(0));
        let seen = hits.clone();
        let cb = Callback::new("count", move |ev| {
            assert_eq!(ev.name, "click");
            seen.set(seen.get() + 1);
        });
        cb.call(&Event { widget: WidgetHandle(1), name: "click".into() });
        assert_eq!(hits.get(), 1);
    }
}
