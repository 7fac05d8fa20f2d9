use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::toolkit::{
    GridAxis, Layout, Toolkit, ToolkitError, VarKind, VariableHandle, WidgetHandle,
};
use crate::value::{Callback, Event, Value};

/// Everything the headless toolkit remembers about one widget.
#[derive(Debug, Clone)]
pub struct HeadlessWidget {
    pub kind: String,
    pub parent: Option<WidgetHandle>,
    pub children: Vec<WidgetHandle>,
    /// Last value set per property name.
    pub properties: BTreeMap<String, Value>,
    /// Bound callbacks per event name, in binding order.
    pub events: BTreeMap<String, Vec<Callback>>,
    pub layout: Option<Layout>,
    /// Grid stretch weights, keyed by axis and index.
    pub grid_weights: BTreeMap<(u8, usize), u32>,
}

impl HeadlessWidget {
    fn new(kind: &str, parent: Option<WidgetHandle>) -> Self {
        Self {
            kind: kind.to_string(),
            parent,
            children: Vec::new(),
            properties: BTreeMap::new(),
            events: BTreeMap::new(),
            layout: None,
            grid_weights: BTreeMap::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn grid_weight(&self, axis: GridAxis, index: usize) -> Option<u32> {
        self.grid_weights.get(&(axis_key(axis), index)).copied()
    }
}

fn axis_key(axis: GridAxis) -> u8 {
    match axis {
        GridAxis::Row => 0,
        GridAxis::Column => 1,
    }
}

/// An in-memory [`Toolkit`] that records the tree it is asked to build.
///
/// Nothing is displayed. Events can be fired by hand with [`fire`], which
/// makes the whole pipeline testable without a display server.
///
/// [`fire`]: HeadlessToolkit::fire
#[derive(Debug, Default)]
pub struct HeadlessToolkit {
    widgets: HashMap<WidgetHandle, HeadlessWidget>,
    variables: HashMap<VariableHandle, Value>,
    /// Restricts `create_widget` to these kinds when set.
    kinds: Option<Vec<String>>,
    next_id: u64,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept the given widget kinds; anything else is
    /// [`ToolkitError::UnknownKind`].
    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    pub fn widget(&self, handle: WidgetHandle) -> Option<&HeadlessWidget> {
        self.widgets.get(&handle)
    }

    pub fn is_alive(&self, handle: WidgetHandle) -> bool {
        self.widgets.contains_key(&handle)
    }

    /// Number of widgets not yet destroyed.
    pub fn live_count(&self) -> usize {
        self.widgets.len()
    }

    /// Run every callback bound to `event` on `handle`. Returns how many ran.
    pub fn fire(&self, handle: WidgetHandle, event: &str) -> usize {
        let Some(callbacks) = self.widgets.get(&handle).and_then(|w| w.events.get(event)) else {
            return 0;
        };
        let ev = Event { widget: handle, name: event.to_string() };
        for cb in callbacks {
            log::trace!("fire {event} on {handle} -> {}", cb.name());
            cb.call(&ev);
        }
        callbacks.len()
    }

    /// Number of variables not yet released.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variable(&self, handle: VariableHandle) -> Option<&Value> {
        self.variables.get(&handle)
    }

    pub fn set_variable(&mut self, handle: VariableHandle, value: Value) -> Result<(), ToolkitError> {
        match self.variables.get_mut(&handle) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ToolkitError::NoSuchVariable(handle)),
        }
    }

    /// Render the subtree under `root` as indented text, one widget per line.
    pub fn dump(&self, root: WidgetHandle) -> String {
        let mut out = String::new();
        self.dump_into(root, 0, &mut out);
        out
    }

    fn dump_into(&self, handle: WidgetHandle, depth: usize, out: &mut String) {
        let Some(w) = self.widgets.get(&handle) else {
            return;
        };
        let pad = "    ".repeat(depth);
        let _ = write!(out, "{pad}{} {handle}", w.kind);
        for (name, value) in &w.properties {
            let _ = write!(out, " {name}={value}");
        }
        for (event, callbacks) in &w.events {
            for cb in callbacks {
                let _ = write!(out, " on:{event}->{}", cb.name());
            }
        }
        if let Some(layout) = &w.layout {
            let _ = write!(out, " [{}", layout.manager);
            for (name, value) in &layout.params {
                let _ = write!(out, " {name}={value}");
            }
            out.push(']');
        }
        out.push('\n');
        for child in &w.children {
            self.dump_into(*child, depth + 1, out);
        }
    }

    fn live_mut(&mut self, handle: WidgetHandle) -> Result<&mut HeadlessWidget, ToolkitError> {
        self.widgets.get_mut(&handle).ok_or(ToolkitError::NoSuchWidget(handle))
    }
}

impl Toolkit for HeadlessToolkit {
    fn create_widget(
        &mut self,
        kind: &str,
        parent: Option<WidgetHandle>,
    ) -> Result<WidgetHandle, ToolkitError> {
        if let Some(kinds) = &self.kinds {
            if !kinds.iter().any(|k| k == kind) {
                return Err(ToolkitError::UnknownKind(kind.to_string()));
            }
        }
        if let Some(p) = parent {
            if !self.is_alive(p) {
                return Err(ToolkitError::NoSuchWidget(p));
            }
        }
        self.next_id += 1;
        let handle = WidgetHandle(self.next_id);
        self.widgets.insert(handle, HeadlessWidget::new(kind, parent));
        if let Some(p) = parent {
            self.live_mut(p)?.children.push(handle);
        }
        log::trace!("create {kind} {handle}");
        Ok(handle)
    }

    fn set_property(
        &mut self,
        widget: WidgetHandle,
        name: &str,
        value: &Value,
    ) -> Result<(), ToolkitError> {
        self.live_mut(widget)?.properties.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn bind_event(
        &mut self,
        widget: WidgetHandle,
        event: &str,
        callback: Callback,
    ) -> Result<(), ToolkitError> {
        self.live_mut(widget)?
            .events
            .entry(event.to_string())
            .or_default()
            .push(callback);
        Ok(())
    }

    fn attach(&mut self, widget: WidgetHandle, layout: &Layout) -> Result<(), ToolkitError> {
        let w = self.live_mut(widget)?;
        if w.parent.is_none() {
            return Err(ToolkitError::Other(format!("{widget} is a top-level window")));
        }
        w.layout = Some(layout.clone());
        Ok(())
    }

    fn configure_grid(
        &mut self,
        container: WidgetHandle,
        axis: GridAxis,
        index: usize,
        weight: u32,
    ) -> Result<(), ToolkitError> {
        self.live_mut(container)?.grid_weights.insert((axis_key(axis), index), weight);
        Ok(())
    }

    fn create_variable(&mut self, kind: VarKind) -> Result<VariableHandle, ToolkitError> {
        self.next_id += 1;
        let handle = VariableHandle(self.next_id);
        self.variables.insert(handle, kind.initial());
        Ok(handle)
    }

    fn destroy_variable(&mut self, var: VariableHandle) -> Result<(), ToolkitError> {
        self.variables.remove(&var).ok_or(ToolkitError::NoSuchVariable(var))?;
        log::trace!("release {var}");
        Ok(())
    }

    fn destroy(&mut self, widget: WidgetHandle) -> Result<(), ToolkitError> {
        let removed = self.widgets.remove(&widget).ok_or(ToolkitError::NoSuchWidget(widget))?;
        if let Some(parent) = removed.parent.and_then(|p| self.widgets.get_mut(&p)) {
            parent.children.retain(|c| *c != widget);
        }
        let mut stack = removed.children;
        while let Some(h) = stack.pop() {
            if let Some(w) = self.widgets.remove(&h) {
                stack.extend(w.children);
            }
        }
        log::trace!("destroy {widget}");
        Ok(())
    }

    fn run_event_loop(&mut self, root: WidgetHandle) -> Result<(), ToolkitError> {
        if !self.is_alive(root) {
            return Err(ToolkitError::NoSuchWidget(root));
        }
        // No display: there is nothing to wait for.
        log::info!("headless event loop for {root} returned immediately");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::toolkit::LayoutManager;

    #[test]
    fn destroy_releases_descendants() {
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        let frame = tk.create_widget("frame", Some(root)).unwrap();
        let label = tk.create_widget("label", Some(frame)).unwrap();
        let other = tk.create_widget("button", Some(root)).unwrap();
        assert_eq!(tk.live_count(), 4);

        tk.destroy(frame).unwrap();
        assert!(!tk.is_alive(label));
        assert!(tk.is_alive(other));
        assert_eq!(tk.widget(root).unwrap().children, vec![other]);

        tk.destroy(root).unwrap();
        assert_eq!(tk.live_count(), 0);
    }

    #[test]
    fn restricted_kinds() {
        let mut tk = HeadlessToolkit::new().with_kinds(["toplevel"]);
        assert!(tk.create_widget("toplevel", None).is_ok());
        assert_eq!(
            tk.create_widget("spinbox", None),
            Err(ToolkitError::UnknownKind("spinbox".into()))
        );
    }

    #[test]
    fn fire_runs_bound_callbacks() {
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        tk.bind_event(root, "click", Callback::new("go", move |_| h.set(h.get() + 1)))
            .unwrap();
        assert_eq!(tk.fire(root, "click"), 1);
        assert_eq!(tk.fire(root, "toggle"), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn root_cannot_be_attached() {
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        assert!(tk.attach(root, &Layout::new(LayoutManager::Pack)).is_err());
    }

    #[test]
    fn dump_shows_properties_and_layout() {
        let mut tk = HeadlessToolkit::new();
        let root = tk.create_widget("toplevel", None).unwrap();
        tk.set_property(root, "title", &Value::Str("Hi".into())).unwrap();
        let b = tk.create_widget("button", Some(root)).unwrap();
        tk.attach(b, &Layout::new(LayoutManager::Pack)).unwrap();
        assert_eq!(tk.dump(root), "toplevel #1 title=\"Hi\"\n    button #2 [pack]\n");
    }

    #[test]
    fn variables_start_empty() {
        let mut tk = HeadlessToolkit::new();
        let v = tk.create_variable(VarKind::Str).unwrap();
        assert_eq!(tk.variable(v), Some(&Value::Str(String::new())));
        tk.set_variable(v, Value::Str("x".into())).unwrap();
        assert_eq!(tk.variable(v), Some(&Value::Str("x".into())));
    }

    #[test]
    fn released_variables_are_gone() {
        let mut tk = HeadlessToolkit::new();
        let v = tk.create_variable(VarKind::Int).unwrap();
        assert_eq!(tk.variable_count(), 1);
        tk.destroy_variable(v).unwrap();
        assert_eq!(tk.variable_count(), 0);
        assert_eq!(tk.destroy_variable(v), Err(ToolkitError::NoSuchVariable(v)));
        assert_eq!(
            tk.set_variable(v, Value::Int(1)),
            Err(ToolkitError::NoSuchVariable(v))
        );
    }
}
