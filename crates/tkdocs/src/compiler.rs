use tkdocs_markup::{parse_str, Document};

use crate::bindings::{Bindings, EventQueue};
use crate::builder::{TreeBuilder, WidgetTree};
use crate::error::CompileError;
use crate::registry::{Registry, RegistrationError};
use crate::toolkit::{LayoutManager, Toolkit, ToolkitError, WidgetHandle};
use crate::value::{Callback, Event, Value, ValueKind};

/// Build-time settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Layout used for widgets that do not say `layout=...`.
    pub default_layout: LayoutManager,
    /// Accept `@identifier` references to widgets declared later in the
    /// document. When off, such references are a `ReferenceError`.
    pub forward_references: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { default_layout: LayoutManager::Pack, forward_references: true }
    }
}

impl CompilerConfig {
    pub fn default_layout(mut self, manager: LayoutManager) -> Self {
        self.default_layout = manager;
        self
    }

    pub fn forward_references(mut self, allow: bool) -> Self {
        self.forward_references = allow;
        self
    }
}

/// Registry, callback bindings and config: everything needed to turn
/// `.tkd` source into widgets.
///
/// ```rust
/// use tkdocs::prelude::*;
///
/// let mut tk = HeadlessToolkit::new();
/// let compiler = Compiler::new().on_event("doThing", |_| println!("clicked"));
/// let tree = compiler
///     .compile(&mut tk, "Window title=\"Hello\"\n    Button label=\"Click\" onClick=doThing\n")
///     .unwrap();
/// assert_eq!(tree.widget_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    registry: Registry,
    bindings: Bindings,
    config: CompilerConfig,
}

impl Compiler {
    /// Built-in vocabulary, no bindings, default config.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self { registry, ..Self::default() }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }

    // ── extension ─────────────────────────────────────────────────────────

    /// Register (or replace) widget type `name`.
    pub fn widget<F>(mut self, name: &str, builder: F) -> Result<Self, RegistrationError>
    where
        F: Fn(&mut dyn Toolkit, Option<WidgetHandle>) -> Result<WidgetHandle, ToolkitError> + 'static,
    {
        self.registry.register_widget(name, builder)?;
        Ok(self)
    }

    /// Register (or replace) `option` on widget type `widget_type`.
    pub fn option<F>(
        mut self,
        widget_type: &str,
        option: &str,
        kind: ValueKind,
        setter: F,
    ) -> Result<Self, RegistrationError>
    where
        F: Fn(&mut dyn Toolkit, WidgetHandle, &Value) -> Result<(), ToolkitError> + 'static,
    {
        self.registry.register_option(widget_type, option, kind, setter)?;
        Ok(self)
    }

    /// Bind callback identifier `name`.
    pub fn on_event(mut self, name: &str, f: impl Fn(&Event) + 'static) -> Self {
        self.bindings.bind(name, f);
        self
    }

    /// Build callbacks for identifiers that were never bound instead of
    /// failing with a `ReferenceError`.
    pub fn on_unbound(mut self, f: impl Fn(&str) -> Callback + 'static) -> Self {
        self.bindings.on_unbound(f);
        self
    }

    /// Route unbound callback identifiers into the returned queue.
    pub fn queue_unbound(&mut self) -> EventQueue {
        self.bindings.queue_unbound()
    }

    /// [`queue_unbound`](Self::queue_unbound) for the end of a builder chain.
    pub fn with_event_queue(mut self) -> (Self, EventQueue) {
        let queue = self.bindings.queue_unbound();
        (self, queue)
    }

    // ── pipeline ──────────────────────────────────────────────────────────

    pub fn parse(&self, src: &str) -> Result<Document, CompileError> {
        Ok(parse_str(src)?)
    }

    /// Build a parsed document against the current registry.
    pub fn build(
        &self,
        toolkit: &mut dyn Toolkit,
        doc: &Document,
    ) -> Result<WidgetTree, CompileError> {
        TreeBuilder::new(&self.registry, &self.bindings, &self.config, toolkit).build(doc)
    }

    /// Parse and build in one step.
    pub fn compile(&self, toolkit: &mut dyn Toolkit, src: &str) -> Result<WidgetTree, CompileError> {
        let doc = self.parse(src)?;
        self.build(toolkit, &doc)
    }

    /// Replace `current` with a tree built from `src`.
    ///
    /// Source that does not parse leaves `current` untouched. Otherwise the
    /// old tree is destroyed before the new one is built, and `current` is
    /// `None` if that build fails.
    pub fn rebuild(
        &self,
        toolkit: &mut dyn Toolkit,
        current: &mut Option<WidgetTree>,
        src: &str,
    ) -> Result<(), CompileError> {
        let doc = self.parse(src)?;
        if let Some(old) = current.take() {
            let root = old.root();
            old.destroy(toolkit).map_err(|source| CompileError::Toolkit {
                widget: format!("previous tree {root}"),
                pos: doc.root.pos,
                source,
            })?;
        }
        *current = Some(self.build(toolkit, &doc)?);
        log::debug!("rebuilt from {} bytes of source", src.len());
        Ok(())
    }
}

/// Compile `src` with the built-in vocabulary and no callback bindings.
pub fn compile(toolkit: &mut dyn Toolkit, src: &str) -> Result<WidgetTree, CompileError> {
    Compiler::new().compile(toolkit, src)
}
