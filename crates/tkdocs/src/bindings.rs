use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::value::{Callback, Event};

type Fallback = Rc<dyn Fn(&str) -> Callback>;

// ── EventQueue ────────────────────────────────────────────────────────────

/// Shared queue of callback names, for applications that would rather poll
/// than register closures.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Rc<RefCell<Vec<String>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: impl Into<String>) {
        self.inner.borrow_mut().push(name.into());
    }

    /// Drain all pending events from the queue.
    pub fn take_events(&self) -> Vec<String> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

// ── Bindings ──────────────────────────────────────────────────────────────

/// Named callbacks that callback-kind options are resolved against.
#[derive(Default, Clone)]
pub struct Bindings {
    callbacks: HashMap<String, Callback>,
    /// Produces a callback for names that were never bound.
    fallback: Option<Fallback>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `f`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, f: impl Fn(&Event) + 'static) {
        let name = name.into();
        let cb = Callback::new(name.clone(), f);
        if self.callbacks.insert(name.clone(), cb).is_some() {
            log::debug!("callback `{name}` rebound");
        }
    }

    pub fn with(mut self, name: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.bind(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Callback> {
        self.callbacks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// The callback for `name`: the bound one, else whatever the fallback
    /// makes of it, else `None`.
    pub fn resolve(&self, name: &str) -> Option<Callback> {
        if let Some(cb) = self.callbacks.get(name) {
            return Some(cb.clone());
        }
        let fallback = self.fallback.as_ref()?;
        log::warn!("callback `{name}` is not bound; using fallback");
        Some(fallback(name))
    }

    /// Call `f` to build a callback for every name that has no binding,
    /// instead of failing the build.
    pub fn on_unbound(&mut self, f: impl Fn(&str) -> Callback + 'static) {
        self.fallback = Some(Rc::new(f));
    }

    /// Route every unbound callback name into a queue; each firing pushes
    /// the name.
    pub fn queue_unbound(&mut self) -> EventQueue {
        let queue = EventQueue::new();
        let sink = queue.clone();
        self.on_unbound(move |name| {
            let sink = sink.clone();
            let owned = name.to_string();
            Callback::new(name, move |_| sink.push(owned.clone()))
        });
        queue
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Bindings")
            .field("callbacks", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::toolkit::WidgetHandle;

    fn click() -> Event {
        Event { widget: WidgetHandle(1), name: "click".into() }
    }

    #[test]
    fn bound_names_resolve() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let b = Bindings::new().with("doThing", move |_| h.set(h.get() + 1));
        b.resolve("doThing").unwrap().call(&click());
        assert_eq!(hits.get(), 1);
        assert!(b.resolve("other").is_none());
    }

    #[test]
    fn rebinding_replaces() {
        let hits = Rc::new(Cell::new(0));
        let mut b = Bindings::new();
        b.bind("go", |_| panic!("old binding"));
        let h = hits.clone();
        b.bind("go", move |_| h.set(7));
        b.get("go").unwrap().call(&click());
        assert_eq!(hits.get(), 7);
    }

    #[test]
    fn unbound_names_queue() {
        let mut b = Bindings::new().with("bound", |_| {});
        let queue = b.queue_unbound();
        let save = b.resolve("save").unwrap();
        assert_eq!(save.name(), "save");
        save.call(&click());
        save.call(&click());
        b.resolve("bound").unwrap().call(&click());
        assert_eq!(queue.take_events(), vec!["save", "save"]);
        assert!(queue.is_empty());
    }
}
