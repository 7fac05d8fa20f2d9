//! Widget-type and option vocabulary.
//!
//! The grammar is fixed; everything a document can say lives here. A
//! [`Registry`] maps widget-type names to builders and `(scope, option)`
//! pairs to typed setters, where the scope is a widget type or the global
//! fallback.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tkdocs_markup::lexer::{is_option_key, is_widget_name};

use crate::builtins;
use crate::toolkit::{Toolkit, ToolkitError, WidgetHandle};
use crate::value::{Value, ValueKind};

/// Creates a widget under an optional parent.
pub type WidgetBuilder =
    Rc<dyn Fn(&mut dyn Toolkit, Option<WidgetHandle>) -> Result<WidgetHandle, ToolkitError>>;

/// Applies a resolved option value to a live widget.
pub type OptionSetter = Rc<dyn Fn(&mut dyn Toolkit, WidgetHandle, &Value) -> Result<(), ToolkitError>>;

/// Option names the builder interprets itself.
pub const RESERVED_OPTIONS: [&str; 2] = ["key", "layout"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{what} name is empty")]
    EmptyName { what: &'static str },
    #[error("`{name}` is not a valid {what} name")]
    InvalidName { what: &'static str, name: String },
    #[error("option `{0}` is reserved")]
    Reserved(String),
}

// ── Definitions ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct WidgetDef {
    pub name: String,
    /// Top-level windows may only appear as the document root.
    pub toplevel: bool,
    builder: WidgetBuilder,
}

impl WidgetDef {
    pub fn build(
        &self,
        toolkit: &mut dyn Toolkit,
        parent: Option<WidgetHandle>,
    ) -> Result<WidgetHandle, ToolkitError> {
        (self.builder)(toolkit, parent)
    }
}

impl fmt::Debug for WidgetDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetDef")
            .field("name", &self.name)
            .field("toplevel", &self.toplevel)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct OptionDef {
    pub name: String,
    pub kind: ValueKind,
    setter: OptionSetter,
}

impl OptionDef {
    pub fn apply(
        &self,
        toolkit: &mut dyn Toolkit,
        widget: WidgetHandle,
        value: &Value,
    ) -> Result<(), ToolkitError> {
        (self.setter)(toolkit, widget, value)
    }
}

impl fmt::Debug for OptionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A setter that forwards the value to `Toolkit::set_property` under
/// `property`.
pub fn property_setter(property: impl Into<String>) -> OptionSetter {
    let property = property.into();
    Rc::new(move |tk: &mut dyn Toolkit, h: WidgetHandle, v: &Value| {
        tk.set_property(h, &property, v)
    })
}

/// A setter that binds a callback value to toolkit event `event`.
pub fn event_setter(event: impl Into<String>) -> OptionSetter {
    let event = event.into();
    Rc::new(move |tk: &mut dyn Toolkit, h: WidgetHandle, v: &Value| match v {
        Value::Callback(cb) => tk.bind_event(h, &event, cb.clone()),
        other => Err(ToolkitError::Property {
            widget: h,
            property: event.clone(),
            reason: format!("expected a callback, got {}", other.type_name()),
        }),
    })
}

// ── Registry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Registry {
    widgets: HashMap<String, WidgetDef>,
    typed: HashMap<String, HashMap<String, OptionDef>>,
    global: HashMap<String, OptionDef>,
}

impl Registry {
    /// An empty registry: no widget types, no options.
    pub fn new() -> Self {
        Self { widgets: HashMap::new(), typed: HashMap::new(), global: HashMap::new() }
    }

    /// A registry seeded with the built-in vocabulary.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        builtins::install(&mut r);
        r
    }

    // ── registration ──────────────────────────────────────────────────────

    /// Add or replace widget type `name`.
    pub fn register_widget<F>(&mut self, name: &str, builder: F) -> Result<(), RegistrationError>
    where
        F: Fn(&mut dyn Toolkit, Option<WidgetHandle>) -> Result<WidgetHandle, ToolkitError> + 'static,
    {
        check_widget_name(name)?;
        self.insert_widget(name, false, Rc::new(builder));
        Ok(())
    }

    /// Add or replace a top-level window type.
    pub fn register_toplevel<F>(&mut self, name: &str, builder: F) -> Result<(), RegistrationError>
    where
        F: Fn(&mut dyn Toolkit, Option<WidgetHandle>) -> Result<WidgetHandle, ToolkitError> + 'static,
    {
        check_widget_name(name)?;
        self.insert_widget(name, true, Rc::new(builder));
        Ok(())
    }

    /// Add or replace `option` for widgets of type `widget_type`.
    pub fn register_option<F>(
        &mut self,
        widget_type: &str,
        option: &str,
        kind: ValueKind,
        setter: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&mut dyn Toolkit, WidgetHandle, &Value) -> Result<(), ToolkitError> + 'static,
    {
        check_widget_name(widget_type)?;
        check_option_name(option)?;
        self.insert_option(Some(widget_type), option, kind, Rc::new(setter));
        Ok(())
    }

    /// Add or replace `option` for every widget type that has no
    /// type-specific entry of that name.
    pub fn register_global_option<F>(
        &mut self,
        option: &str,
        kind: ValueKind,
        setter: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&mut dyn Toolkit, WidgetHandle, &Value) -> Result<(), ToolkitError> + 'static,
    {
        check_option_name(option)?;
        self.insert_option(None, option, kind, Rc::new(setter));
        Ok(())
    }

    pub(crate) fn insert_widget(&mut self, name: &str, toplevel: bool, builder: WidgetBuilder) {
        let def = WidgetDef { name: name.to_string(), toplevel, builder };
        if self.widgets.insert(name.to_string(), def).is_some() {
            log::debug!("widget type `{name}` re-registered");
        }
    }

    /// `scope` is a widget type, or `None` for the global scope.
    pub(crate) fn insert_option(
        &mut self,
        scope: Option<&str>,
        option: &str,
        kind: ValueKind,
        setter: OptionSetter,
    ) {
        let def = OptionDef { name: option.to_string(), kind, setter };
        let table = match scope {
            Some(widget_type) => self.typed.entry(widget_type.to_string()).or_default(),
            None => &mut self.global,
        };
        if table.insert(option.to_string(), def).is_some() {
            log::debug!("option `{}.{option}` re-registered", scope.unwrap_or("*"));
        }
    }

    // ── lookup ────────────────────────────────────────────────────────────

    pub fn widget(&self, name: &str) -> Option<&WidgetDef> {
        self.widgets.get(name)
    }

    /// Type-scoped entry first, then the global one.
    pub fn option(&self, widget_type: &str, name: &str) -> Option<&OptionDef> {
        self.typed
            .get(widget_type)
            .and_then(|t| t.get(name))
            .or_else(|| self.global.get(name))
    }

    /// Registered widget-type names, sorted.
    pub fn widget_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.widgets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("widgets", &self.widget_names())
            .field("global_options", &self.global.len())
            .finish_non_exhaustive()
    }
}

fn check_widget_name(name: &str) -> Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::EmptyName { what: "widget" });
    }
    if !is_widget_name(name) {
        return Err(RegistrationError::InvalidName { what: "widget", name: name.to_string() });
    }
    Ok(())
}

fn check_option_name(name: &str) -> Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::EmptyName { what: "option" });
    }
    if !is_option_key(name) {
        return Err(RegistrationError::InvalidName { what: "option", name: name.to_string() });
    }
    if RESERVED_OPTIONS.contains(&name) {
        return Err(RegistrationError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::HeadlessToolkit;

    fn frame_builder(tk: &mut dyn Toolkit, p: Option<WidgetHandle>) -> Result<WidgetHandle, ToolkitError> {
        tk.create_widget("frame", p)
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let r = Registry::new();
        assert!(r.widget("Window").is_none());
        assert!(r.option("Label", "text").is_none());
    }

    #[test]
    fn default_has_builtins() {
        let r = Registry::default();
        assert!(r.widget("Window").unwrap().toplevel);
        assert!(!r.widget("Button").unwrap().toplevel);
        assert_eq!(r.option("Button", "onClick").unwrap().kind, ValueKind::Callback);
    }

    #[test]
    fn invalid_names_rejected() {
        let mut r = Registry::new();
        assert_eq!(
            r.register_widget("", frame_builder),
            Err(RegistrationError::EmptyName { what: "widget" })
        );
        assert!(matches!(
            r.register_widget("9lives", frame_builder),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(matches!(
            r.register_global_option("a.b", ValueKind::Str, |_, _, _| Ok(())),
            Err(RegistrationError::InvalidName { .. })
        ));
        for reserved in RESERVED_OPTIONS {
            assert_eq!(
                r.register_option("Frame", reserved, ValueKind::Str, |_, _, _| Ok(())),
                Err(RegistrationError::Reserved(reserved.into()))
            );
        }
    }

    #[test]
    fn type_scope_shadows_global() {
        let mut r = Registry::new();
        r.register_global_option("text", ValueKind::Str, |_, _, _| Ok(())).unwrap();
        r.register_option("Spin", "text", ValueKind::Int, |_, _, _| Ok(())).unwrap();
        assert_eq!(r.option("Spin", "text").unwrap().kind, ValueKind::Int);
        assert_eq!(r.option("Label", "text").unwrap().kind, ValueKind::Str);
    }

    #[test]
    fn last_registration_wins() {
        let mut r = Registry::new();
        r.register_widget("Panel", frame_builder).unwrap();
        r.register_widget("Panel", |tk, p| tk.create_widget("canvas", p)).unwrap();
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        let h = r.widget("Panel").unwrap().build(&mut tk, Some(root)).unwrap();
        assert_eq!(tk.widget(h).unwrap().kind, "canvas");
        assert_eq!(r.widget_count(), 1);
    }

    #[test]
    fn event_setter_rejects_non_callbacks() {
        let setter = event_setter("click");
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        assert!(setter(&mut tk, root, &Value::Int(1)).is_err());
    }
}
