//! The vocabulary every default [`Registry`] starts with.

use std::rc::Rc;

use crate::registry::{event_setter, property_setter, Registry, WidgetBuilder};
use crate::toolkit::{Toolkit, ToolkitError, VarKind, WidgetHandle};
use crate::value::{Value, ValueKind};

/// `(markup name, toolkit kind)` for every built-in widget type.
const WIDGETS: &[(&str, &str)] = &[
    ("Frame", "frame"),
    ("Label", "label"),
    ("Entry", "entry"),
    ("Text", "text"),
    ("Canvas", "canvas"),
    ("Button", "button"),
    ("Radio", "radiobutton"),
    ("Check", "checkbutton"),
];

const GLOBAL_STR: &[&str] = &["text", "bg", "fg", "font", "relief", "anchor", "justify", "state"];
const GLOBAL_INT: &[&str] = &["width", "height", "padx", "pady", "borderwidth"];

/// `(widget type, option, event)` for callback options.
const EVENTS: &[(&str, &str, &str)] = &[
    ("Button", "onClick", "click"),
    ("Button", "command", "click"),
    ("Entry", "onChange", "change"),
    ("Check", "onToggle", "toggle"),
    ("Canvas", "onClick", "click"),
];

/// `(widget type, option, variable kind)` for options naming a shared variable.
const VARIABLES: &[(&str, &str, VarKind)] = &[
    ("Entry", "textvariable", VarKind::Str),
    ("Label", "textvariable", VarKind::Str),
    ("Combo", "textvariable", VarKind::Str),
    ("Radio", "variable", VarKind::Int),
    ("Check", "variable", VarKind::Int),
];

pub(crate) fn install(r: &mut Registry) {
    r.insert_widget(
        "Window",
        true,
        Rc::new(|tk: &mut dyn Toolkit, parent: Option<WidgetHandle>| tk.create_widget("toplevel", parent)),
    );
    for &(name, kind) in WIDGETS {
        r.insert_widget(name, false, simple_builder(kind));
    }
    // Combo boxes only accept values from their list.
    r.insert_widget(
        "Combo",
        false,
        Rc::new(|tk: &mut dyn Toolkit, parent: Option<WidgetHandle>| -> Result<WidgetHandle, ToolkitError> {
            let h = tk.create_widget("combobox", parent)?;
            tk.set_property(h, "state", &Value::Str("readonly".into()))?;
            Ok(h)
        }),
    );

    for &name in GLOBAL_STR {
        r.insert_option(None, name, ValueKind::Str, property_setter(name));
    }
    for &name in GLOBAL_INT {
        r.insert_option(None, name, ValueKind::Int, property_setter(name));
    }

    r.insert_option(Some("Window"), "title", ValueKind::Str, property_setter("title"));
    r.insert_option(Some("Window"), "geometry", ValueKind::Str, property_setter("geometry"));
    r.insert_option(Some("Window"), "resizable", ValueKind::Bool, property_setter("resizable"));

    r.insert_option(Some("Button"), "label", ValueKind::Str, property_setter("text"));
    r.insert_option(Some("Radio"), "value", ValueKind::Int, property_setter("value"));
    r.insert_option(
        Some("Combo"),
        "values",
        ValueKind::list_of(ValueKind::Str),
        property_setter("values"),
    );

    for &(widget, option, event) in EVENTS {
        r.insert_option(Some(widget), option, ValueKind::Callback, event_setter(event));
    }
    for &(widget, option, kind) in VARIABLES {
        r.insert_option(Some(widget), option, ValueKind::Variable(kind), property_setter(option));
    }

    log::debug!("installed {} built-in widget types", r.widget_count());
}

fn simple_builder(kind: &'static str) -> WidgetBuilder {
    Rc::new(move |tk: &mut dyn Toolkit, parent: Option<WidgetHandle>| tk.create_widget(kind, parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::HeadlessToolkit;

    #[test]
    fn every_widget_builds_under_a_window() {
        let r = Registry::with_builtins();
        let mut tk = HeadlessToolkit::new();
        let root = r.widget("Window").unwrap().build(&mut tk, None).unwrap();
        for name in r.widget_names() {
            if name == "Window" {
                continue;
            }
            let h = r.widget(name).unwrap().build(&mut tk, Some(root)).unwrap();
            assert_eq!(tk.widget(h).unwrap().parent, Some(root), "{name}");
        }
        assert_eq!(r.widget_count(), 10);
    }

    #[test]
    fn combo_is_readonly() {
        let r = Registry::with_builtins();
        let mut tk = HeadlessToolkit::new();
        let root = r.widget("Window").unwrap().build(&mut tk, None).unwrap();
        let combo = r.widget("Combo").unwrap().build(&mut tk, Some(root)).unwrap();
        assert_eq!(
            tk.widget(combo).unwrap().property("state"),
            Some(&Value::Str("readonly".into()))
        );
    }

    #[test]
    fn button_label_sets_text() {
        let r = Registry::with_builtins();
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        let label = r.option("Button", "label").unwrap();
        label.apply(&mut tk, root, &Value::Str("Click".into())).unwrap();
        assert_eq!(tk.widget(root).unwrap().property("text"), Some(&Value::Str("Click".into())));
    }

    #[test]
    fn option_kinds() {
        let r = Registry::with_builtins();
        assert_eq!(r.option("Frame", "width").unwrap().kind, ValueKind::Int);
        assert_eq!(r.option("Window", "resizable").unwrap().kind, ValueKind::Bool);
        assert_eq!(
            r.option("Radio", "variable").unwrap().kind,
            ValueKind::Variable(VarKind::Int)
        );
        assert!(r.option("Label", "onClick").is_none());
        assert!(r.option("Label", "title").is_none());
    }
}
