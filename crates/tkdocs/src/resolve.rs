//! Turns raw option text into typed [`Value`]s.
//!
//! The shape of the text comes from [`Literal`]; what it means comes from
//! the [`ValueKind`] the option was registered with. Anything that needs
//! state outside the text (built widgets, callbacks, variables) goes
//! through an [`Environment`].

use thiserror::Error;
use tkdocs_markup::Literal;
use tkdocs_markup::lexer::is_widget_name;

use crate::toolkit::{ToolkitError, VarKind, VariableHandle, WidgetHandle};
use crate::value::{Callback, Value, ValueKind};

/// Where a referenced identifier stands during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefState {
    Built(WidgetHandle),
    /// Declared somewhere in the document, but its widget does not exist yet.
    Pending,
    Undeclared,
}

/// Build-time state the resolver reads from.
pub trait Environment {
    fn reference(&self, identifier: &str) -> RefState;
    fn callback(&self, name: &str) -> Option<Callback>;
    /// The shared variable called `name`, created on first use.
    fn variable(&mut self, name: &str, kind: VarKind) -> Result<VariableHandle, ToolkitError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The text is not a valid literal of the expected kind.
    #[error("{0}")]
    Invalid(String),
    #[error("no {target} named `{identifier}`")]
    Undeclared {
        identifier: String,
        target: &'static str,
    },
    /// The reference is declared but its widget has not been created yet.
    #[error("`@{0}` is not built yet")]
    Pending(String),
    #[error(transparent)]
    Toolkit(#[from] ToolkitError),
}

/// Resolve `raw` option text as `kind`.
pub fn resolve(
    raw: &str,
    kind: &ValueKind,
    env: &mut dyn Environment,
) -> Result<Value, ResolveError> {
    let lit = Literal::parse(raw)
        .ok_or_else(|| ResolveError::Invalid(format!("malformed value `{raw}`")))?;
    resolve_literal(&lit, kind, env)
}

fn resolve_literal(
    lit: &Literal,
    kind: &ValueKind,
    env: &mut dyn Environment,
) -> Result<Value, ResolveError> {
    match (kind, lit) {
        (ValueKind::Str, Literal::Quoted(s) | Literal::Bare(s)) => Ok(Value::Str(s.clone())),

        (ValueKind::Int, Literal::Bare(s)) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ResolveError::Invalid(format!("`{s}` is not an integer"))),

        (ValueKind::Float, Literal::Bare(s)) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Float(v)),
            _ => Err(ResolveError::Invalid(format!("`{s}` is not a finite number"))),
        },

        (ValueKind::Bool, Literal::Bare(s)) => match s.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ResolveError::Invalid(format!("`{s}` is not `true` or `false`"))),
        },

        (ValueKind::Reference | ValueKind::Any, Literal::Reference(id)) => {
            match env.reference(id) {
                RefState::Built(h) => Ok(Value::Widget(h)),
                RefState::Pending => Err(ResolveError::Pending(id.clone())),
                RefState::Undeclared => Err(ResolveError::Undeclared {
                    identifier: id.clone(),
                    target: "widget",
                }),
            }
        }

        (ValueKind::Callback, Literal::Bare(name)) => {
            check_identifier(name)?;
            env.callback(name).map(Value::Callback).ok_or_else(|| ResolveError::Undeclared {
                identifier: name.clone(),
                target: "callback",
            })
        }

        (ValueKind::Variable(vk), Literal::Bare(name)) => {
            check_identifier(name)?;
            Ok(Value::Variable(env.variable(name, *vk)?))
        }

        (ValueKind::List(inner), Literal::List(items)) => items
            .iter()
            .map(|item| resolve_literal(item, inner, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        (ValueKind::Any, Literal::List(items)) => items
            .iter()
            .map(|item| resolve_literal(item, &ValueKind::Any, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        (ValueKind::Any, Literal::Quoted(s)) => Ok(Value::Str(s.clone())),
        (ValueKind::Any, Literal::Bare(s)) => Ok(infer(s)),

        (expected, found) => Err(ResolveError::Invalid(format!(
            "expected {expected}, found {}",
            found.describe()
        ))),
    }
}

/// Bool, then integer, then finite float, else the word itself.
fn infer(word: &str) -> Value {
    match word {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(v) = word.parse::<i64>() {
        return Value::Int(v);
    }
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Float(v),
        _ => Value::Str(word.to_string()),
    }
}

fn check_identifier(name: &str) -> Result<(), ResolveError> {
    if is_widget_name(name) {
        Ok(())
    } else {
        Err(ResolveError::Invalid(format!("`{name}` is not an identifier")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct FakeEnv {
        built: HashMap<String, WidgetHandle>,
        pending: Vec<String>,
        callbacks: HashMap<String, Callback>,
        variables: HashMap<String, VariableHandle>,
    }

    impl Environment for FakeEnv {
        fn reference(&self, identifier: &str) -> RefState {
            if let Some(h) = self.built.get(identifier) {
                RefState::Built(*h)
            } else if self.pending.iter().any(|p| p == identifier) {
                RefState::Pending
            } else {
                RefState::Undeclared
            }
        }

        fn callback(&self, name: &str) -> Option<Callback> {
            self.callbacks.get(name).cloned()
        }

        fn variable(&mut self, name: &str, _kind: VarKind) -> Result<VariableHandle, ToolkitError> {
            let next = VariableHandle(self.variables.len() as u64 + 100);
            Ok(*self.variables.entry(name.to_string()).or_insert(next))
        }
    }

    fn ok(raw: &str, kind: ValueKind) -> Value {
        resolve(raw, &kind, &mut FakeEnv::default()).unwrap()
    }

    fn invalid(raw: &str, kind: ValueKind) {
        assert!(
            matches!(resolve(raw, &kind, &mut FakeEnv::default()), Err(ResolveError::Invalid(_))),
            "{raw:?} as {kind}"
        );
    }

    #[test]
    fn scalars() {
        assert_eq!(ok(r#""Hello""#, ValueKind::Str), Value::Str("Hello".into()));
        assert_eq!(ok("Hello", ValueKind::Str), Value::Str("Hello".into()));
        assert_eq!(ok("-12", ValueKind::Int), Value::Int(-12));
        assert_eq!(ok("2.5", ValueKind::Float), Value::Float(2.5));
        assert_eq!(ok("true", ValueKind::Bool), Value::Bool(true));
    }

    #[test]
    fn scalar_failures_never_default() {
        invalid("12px", ValueKind::Int);
        invalid(r#""12""#, ValueKind::Int);
        invalid("inf", ValueKind::Float);
        invalid("True", ValueKind::Bool);
        invalid("{a:b}", ValueKind::Str);
        invalid("@main", ValueKind::Str);
    }

    #[test]
    fn references() {
        let mut env = FakeEnv::default();
        env.built.insert("main".into(), WidgetHandle(7));
        env.pending.push("later".into());
        assert_eq!(
            resolve("@main", &ValueKind::Reference, &mut env),
            Ok(Value::Widget(WidgetHandle(7)))
        );
        assert_eq!(
            resolve("@later", &ValueKind::Reference, &mut env),
            Err(ResolveError::Pending("later".into()))
        );
        assert!(matches!(
            resolve("@nope", &ValueKind::Reference, &mut env),
            Err(ResolveError::Undeclared { target: "widget", .. })
        ));
        invalid("main", ValueKind::Reference);
    }

    #[test]
    fn callbacks() {
        let mut env = FakeEnv::default();
        let cb = Callback::new("app.quit", |_| {});
        env.callbacks.insert("app.quit".into(), cb.clone());
        assert_eq!(resolve("app.quit", &ValueKind::Callback, &mut env), Ok(Value::Callback(cb)));
        assert_eq!(
            resolve("doThing", &ValueKind::Callback, &mut env),
            Err(ResolveError::Undeclared { identifier: "doThing".into(), target: "callback" })
        );
        invalid(r#""doThing""#, ValueKind::Callback);
        invalid("#fff", ValueKind::Callback);
    }

    #[test]
    fn variables_are_shared_by_name() {
        let mut env = FakeEnv::default();
        let kind = ValueKind::Variable(VarKind::Str);
        let a = resolve("name", &kind, &mut env).unwrap();
        let b = resolve("name", &kind, &mut env).unwrap();
        let c = resolve("other", &kind, &mut env).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn typed_lists() {
        assert_eq!(
            ok(r#"{small:"extra large"}"#, ValueKind::list_of(ValueKind::Str)),
            Value::List(vec![Value::Str("small".into()), Value::Str("extra large".into())])
        );
        assert_eq!(ok("{}", ValueKind::list_of(ValueKind::Int)), Value::List(vec![]));
        invalid("{1:x}", ValueKind::list_of(ValueKind::Int));
        invalid("small", ValueKind::list_of(ValueKind::Str));
    }

    #[test]
    fn inference_order() {
        assert_eq!(ok("true", ValueKind::Any), Value::Bool(true));
        assert_eq!(ok("3", ValueKind::Any), Value::Int(3));
        assert_eq!(ok("3.5", ValueKind::Any), Value::Float(3.5));
        assert_eq!(ok("nan", ValueKind::Any), Value::Str("nan".into()));
        assert_eq!(ok(r#""3""#, ValueKind::Any), Value::Str("3".into()));
        assert_eq!(ok("nsew", ValueKind::Any), Value::Str("nsew".into()));
        assert_eq!(
            ok("{1:a}", ValueKind::Any),
            Value::List(vec![Value::Int(1), Value::Str("a".into())])
        );
    }
}
