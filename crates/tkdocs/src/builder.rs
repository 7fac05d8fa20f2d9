//! Document → live widget tree.
//!
//! Building is two passes over the [`Document`]. The first collects every
//! `key=identifier` declaration and checks that each `@identifier` names one
//! of them; nothing is created if that fails. The second walks the tree in
//! pre-order, creating each widget under its parent, applying its options
//! in declared order, and attaching it with its layout. Options that refer
//! to a widget further down the document are applied once the whole tree
//! exists.
//!
//! A failed build destroys whatever it created.

use std::collections::HashMap;

use tkdocs_markup::lexer::is_widget_name;
use tkdocs_markup::{Document, Literal, Node, Opt, SourcePos};

use crate::bindings::Bindings;
use crate::compiler::CompilerConfig;
use crate::error::{CompileError, ReferenceError, ValueError};
use crate::registry::{OptionDef, Registry};
use crate::resolve::{resolve, Environment, RefState, ResolveError};
use crate::toolkit::{
    GridAxis, Layout, LayoutManager, Toolkit, ToolkitError, VarKind, VariableHandle, WidgetHandle,
};
use crate::value::{Callback, Value, ValueKind};

// ── WidgetTree ────────────────────────────────────────────────────────────

/// The result of a successful build.
///
/// Dropping it leaves the widgets alive; call [`destroy`](Self::destroy) to
/// release them.
#[derive(Debug, Clone)]
pub struct WidgetTree {
    root: WidgetHandle,
    named: HashMap<String, WidgetHandle>,
    variables: HashMap<String, VariableHandle>,
    widgets: usize,
}

impl WidgetTree {
    pub fn root(&self) -> WidgetHandle {
        self.root
    }

    /// The widget declared with `key=identifier`.
    pub fn get(&self, identifier: &str) -> Option<WidgetHandle> {
        self.named.get(identifier).copied()
    }

    pub fn variable(&self, name: &str) -> Option<VariableHandle> {
        self.variables.get(name).copied()
    }

    /// Identifiers declared in the document, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.named.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of widgets the build created.
    pub fn widget_count(&self) -> usize {
        self.widgets
    }

    /// Hand control to the toolkit's event loop.
    pub fn run(&self, toolkit: &mut dyn Toolkit) -> Result<(), ToolkitError> {
        toolkit.run_event_loop(self.root)
    }

    /// Destroy the root and, with it, every widget in the tree, then release
    /// the tree's variables.
    pub fn destroy(self, toolkit: &mut dyn Toolkit) -> Result<(), ToolkitError> {
        log::debug!("destroying widget tree {}", self.root);
        toolkit.destroy(self.root)?;
        for (_, var) in self.variables {
            toolkit.destroy_variable(var)?;
        }
        Ok(())
    }
}

// ── TreeBuilder ───────────────────────────────────────────────────────────

/// An option whose reference target did not exist yet when it was reached.
struct Deferred {
    widget: String,
    handle: WidgetHandle,
    opt: Opt,
    def: OptionDef,
}

/// One build of one document. Consumed by [`build`](Self::build).
pub struct TreeBuilder<'a> {
    registry: &'a Registry,
    bindings: &'a Bindings,
    config: &'a CompilerConfig,
    toolkit: &'a mut dyn Toolkit,

    declared: HashMap<String, SourcePos>,
    named: HashMap<String, WidgetHandle>,
    variables: HashMap<String, (VariableHandle, VarKind)>,
    deferred: Vec<Deferred>,
    /// Rows and columns already weighted per grid container.
    grids: HashMap<WidgetHandle, [usize; 2]>,
    widgets: usize,
    root: Option<WidgetHandle>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        registry: &'a Registry,
        bindings: &'a Bindings,
        config: &'a CompilerConfig,
        toolkit: &'a mut dyn Toolkit,
    ) -> Self {
        Self {
            registry,
            bindings,
            config,
            toolkit,
            declared: HashMap::new(),
            named: HashMap::new(),
            variables: HashMap::new(),
            deferred: Vec::new(),
            grids: HashMap::new(),
            widgets: 0,
            root: None,
        }
    }

    /// Build `doc`. On failure nothing created by this build stays alive.
    pub fn build(mut self, doc: &Document) -> Result<WidgetTree, CompileError> {
        log::debug!("building {} ({} nodes)", doc.source.name, doc.node_count());
        match self.run(doc) {
            Ok(root) => {
                log::debug!("built {} widgets under {root}", self.widgets);
                Ok(WidgetTree {
                    root,
                    named: self.named,
                    variables: self.variables.into_iter().map(|(k, (h, _))| (k, h)).collect(),
                    widgets: self.widgets,
                })
            }
            Err(e) => {
                if let Some(root) = self.root {
                    log::debug!("build failed; destroying partial tree {root}");
                    if let Err(te) = self.toolkit.destroy(root) {
                        log::warn!("could not destroy partial tree {root}: {te}");
                    }
                }
                for (name, (var, _)) in self.variables.drain() {
                    if let Err(te) = self.toolkit.destroy_variable(var) {
                        log::warn!("could not release variable `{name}` ({var}): {te}");
                    }
                }
                Err(e)
            }
        }
    }

    fn run(&mut self, doc: &Document) -> Result<WidgetHandle, CompileError> {
        self.collect(&doc.root)?;
        let root = self.build_node(&doc.root, None, 0)?;
        self.apply_deferred()?;
        Ok(root)
    }

    // ── pass 1: identifiers ───────────────────────────────────────────────

    fn collect(&mut self, root: &Node) -> Result<(), CompileError> {
        for node in root.walk() {
            let Some(opt) = node.option("key") else { continue };
            let id = identifier_of(node, opt)?;
            if let Some(first) = self.declared.get(&id) {
                return Err(ReferenceError {
                    widget: node.widget.clone(),
                    identifier: id,
                    reason: format!("already declared at {first}"),
                    pos: opt.pos,
                }
                .into());
            }
            self.declared.insert(id, opt.pos);
        }

        for node in root.walk() {
            for opt in &node.options {
                // Malformed values are reported with their option later.
                let Some(lit) = Literal::parse(&opt.value) else { continue };
                let mut ids = Vec::new();
                references(&lit, &mut ids);
                if let Some(missing) = ids.into_iter().find(|id| !self.declared.contains_key(*id)) {
                    return Err(ReferenceError {
                        widget: node.widget.clone(),
                        identifier: missing.to_string(),
                        reason: format!("no widget is declared with `key={missing}`"),
                        pos: opt.pos,
                    }
                    .into());
                }
            }
        }
        log::trace!("{} identifiers declared", self.declared.len());
        Ok(())
    }

    // ── pass 2: widgets ───────────────────────────────────────────────────

    fn build_node(
        &mut self,
        node: &Node,
        parent: Option<WidgetHandle>,
        index: usize,
    ) -> Result<WidgetHandle, CompileError> {
        let registry = self.registry;
        let def = registry.widget(&node.widget).ok_or_else(|| CompileError::UnknownWidget {
            widget: node.widget.clone(),
            pos: node.pos,
        })?;
        match (parent.is_none(), def.toplevel) {
            (true, false) => {
                return Err(CompileError::InvalidRoot { widget: node.widget.clone(), pos: node.pos });
            }
            (false, true) => {
                return Err(CompileError::NestedRoot { widget: node.widget.clone(), pos: node.pos });
            }
            _ => {}
        }

        let handle = def.build(&mut *self.toolkit, parent).map_err(|e| toolkit_error(node, e))?;
        if parent.is_none() {
            self.root = Some(handle);
        }
        self.widgets += 1;
        log::trace!("{} {} at {}", node.widget, handle, node.pos);

        if let Some(opt) = node.option("key") {
            self.named.insert(identifier_of(node, opt)?, handle);
        }

        let mut layout: Option<Layout> = None;
        for opt in &node.options {
            match opt.key.as_str() {
                "key" => {}
                "layout" => {
                    if parent.is_none() {
                        return Err(layout_error(node, "the root window has no layout"));
                    }
                    layout = Some(Layout::new(layout_manager(node, opt)?));
                }
                _ => match layout.as_mut() {
                    Some(layout) => {
                        let value = self.resolve_option(node, opt, &ValueKind::Any)?;
                        layout.params.push((opt.key.clone(), value));
                    }
                    None => self.apply_option(node, handle, opt)?,
                },
            }
        }

        if let Some(parent) = parent {
            let explicit = layout.is_some();
            let layout = layout.unwrap_or_else(|| Layout::new(self.config.default_layout));
            self.attach(node, handle, parent, layout, explicit, index)?;
        }

        for (i, child) in node.children.iter().enumerate() {
            self.build_node(child, Some(handle), i)?;
        }
        Ok(handle)
    }

    fn apply_option(
        &mut self,
        node: &Node,
        handle: WidgetHandle,
        opt: &Opt,
    ) -> Result<(), CompileError> {
        let registry = self.registry;
        let def = registry.option(&node.widget, &opt.key).ok_or_else(|| {
            CompileError::UnknownOption {
                widget: node.widget.clone(),
                option: opt.key.clone(),
                pos: opt.pos,
            }
        })?;

        match resolve(&opt.value, &def.kind, self) {
            Ok(value) => {
                log::trace!("  {}={value}", opt.key);
                def.apply(&mut *self.toolkit, handle, &value)
                    .map_err(|e| toolkit_error(node, e))
            }
            Err(ResolveError::Pending(id)) if self.config.forward_references => {
                log::trace!("  {} waits for @{id}", opt.key);
                self.deferred.push(Deferred {
                    widget: node.widget.clone(),
                    handle,
                    opt: opt.clone(),
                    def: def.clone(),
                });
                Ok(())
            }
            Err(e) => Err(resolve_error(&node.widget, opt, e)),
        }
    }

    fn resolve_option(
        &mut self,
        node: &Node,
        opt: &Opt,
        kind: &ValueKind,
    ) -> Result<Value, CompileError> {
        resolve(&opt.value, kind, self).map_err(|e| resolve_error(&node.widget, opt, e))
    }

    fn apply_deferred(&mut self) -> Result<(), CompileError> {
        let deferred = std::mem::take(&mut self.deferred);
        if !deferred.is_empty() {
            log::debug!("applying {} forward references", deferred.len());
        }
        for d in deferred {
            let value = resolve(&d.opt.value, &d.def.kind, self)
                .map_err(|e| resolve_error(&d.widget, &d.opt, e))?;
            d.def.apply(&mut *self.toolkit, d.handle, &value).map_err(|e| {
                CompileError::Toolkit { widget: d.widget.clone(), pos: d.opt.pos, source: e }
            })?;
        }
        Ok(())
    }

    // ── layout ────────────────────────────────────────────────────────────

    fn attach(
        &mut self,
        node: &Node,
        handle: WidgetHandle,
        parent: WidgetHandle,
        mut layout: Layout,
        explicit: bool,
        index: usize,
    ) -> Result<(), CompileError> {
        if layout.manager == LayoutManager::Grid {
            // Implicit grid placement stacks siblings in column 0.
            let default_row = (!explicit).then_some(index);
            let default_col = (!explicit).then_some(0);
            let row = grid_index(node, &layout, "row", default_row)?;
            let column = grid_index(node, &layout, "column", default_col)?;
            let rowspan = grid_span(node, &layout, "rowspan")?;
            let columnspan = grid_span(node, &layout, "columnspan")?;
            if row + rowspan > MAX_GRID_INDEX + 1 || column + columnspan > MAX_GRID_INDEX + 1 {
                return Err(layout_error(
                    node,
                    format!("grid cell extends past row/column {MAX_GRID_INDEX}"),
                ));
            }
            if !explicit {
                layout.params.push(("row".into(), Value::Int(row as i64)));
                layout.params.push(("column".into(), Value::Int(column as i64)));
            }
            self.weight_grid(node, parent, GridAxis::Row, row + rowspan)?;
            self.weight_grid(node, parent, GridAxis::Column, column + columnspan)?;
        }
        self.toolkit.attach(handle, &layout).map_err(|e| toolkit_error(node, e))
    }

    /// Give every not-yet-weighted row (or column) below `upto` weight 1.
    fn weight_grid(
        &mut self,
        node: &Node,
        container: WidgetHandle,
        axis: GridAxis,
        upto: usize,
    ) -> Result<(), CompileError> {
        let slot = match axis {
            GridAxis::Row => 0,
            GridAxis::Column => 1,
        };
        let done = self.grids.entry(container).or_default()[slot];
        for i in done..upto {
            self.toolkit
                .configure_grid(container, axis, i, 1)
                .map_err(|e| toolkit_error(node, e))?;
        }
        if upto > done {
            self.grids.entry(container).or_default()[slot] = upto;
        }
        Ok(())
    }
}

impl Environment for TreeBuilder<'_> {
    fn reference(&self, identifier: &str) -> RefState {
        if let Some(h) = self.named.get(identifier) {
            RefState::Built(*h)
        } else if self.declared.contains_key(identifier) {
            RefState::Pending
        } else {
            RefState::Undeclared
        }
    }

    fn callback(&self, name: &str) -> Option<Callback> {
        self.bindings.resolve(name)
    }

    fn variable(&mut self, name: &str, kind: VarKind) -> Result<VariableHandle, ToolkitError> {
        if let Some((h, existing)) = self.variables.get(name) {
            if *existing != kind {
                log::warn!("variable `{name}` is {existing} but used as {kind}");
            }
            return Ok(*h);
        }
        let h = self.toolkit.create_variable(kind)?;
        log::trace!("variable `{name}` = {h}");
        self.variables.insert(name.to_string(), (h, kind));
        Ok(h)
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

fn identifier_of(node: &Node, opt: &Opt) -> Result<String, CompileError> {
    match Literal::parse(&opt.value) {
        Some(Literal::Bare(id)) if is_widget_name(&id) => Ok(id),
        _ => Err(ValueError {
            widget: node.widget.clone(),
            option: opt.key.clone(),
            raw: opt.value.clone(),
            reason: "expected a bare identifier".into(),
            pos: opt.pos,
        }
        .into()),
    }
}

fn references<'l>(lit: &'l Literal, out: &mut Vec<&'l str>) {
    match lit {
        Literal::Reference(id) => out.push(id),
        Literal::List(items) => items.iter().for_each(|item| references(item, out)),
        Literal::Quoted(_) | Literal::Bare(_) => {}
    }
}

fn layout_manager(node: &Node, opt: &Opt) -> Result<LayoutManager, CompileError> {
    let name = match Literal::parse(&opt.value) {
        Some(Literal::Bare(s) | Literal::Quoted(s)) => s,
        _ => String::new(),
    };
    LayoutManager::parse(&name).ok_or_else(|| {
        layout_error(node, format!("unknown layout manager `{}` (pack, grid or place)", opt.value))
    })
}

/// Largest row or column a grid child may occupy. Rows and columns below
/// a child's last cell are all weighted, so this also caps that work.
pub const MAX_GRID_INDEX: usize = 10_000;

fn grid_index(
    node: &Node,
    layout: &Layout,
    name: &str,
    default: Option<usize>,
) -> Result<usize, CompileError> {
    match (layout.param(name), default) {
        (Some(Value::Int(v)), _) if (0..=MAX_GRID_INDEX as i64).contains(v) => Ok(*v as usize),
        (Some(other), _) => Err(layout_error(
            node,
            format!("grid `{name}` must be an integer in 0..={MAX_GRID_INDEX}, got {other}"),
        )),
        (None, Some(d)) if d <= MAX_GRID_INDEX => Ok(d),
        (None, Some(d)) => Err(layout_error(
            node,
            format!("implicit grid `{name}` {d} is past {MAX_GRID_INDEX}"),
        )),
        (None, None) => Err(layout_error(node, format!("grid layout needs `{name}`"))),
    }
}

fn grid_span(node: &Node, layout: &Layout, name: &str) -> Result<usize, CompileError> {
    match layout.param(name) {
        None => Ok(1),
        Some(Value::Int(v)) if (1..=MAX_GRID_INDEX as i64 + 1).contains(v) => Ok(*v as usize),
        Some(other) => Err(layout_error(
            node,
            format!("grid `{name}` must be an integer in 1..={}, got {other}", MAX_GRID_INDEX + 1),
        )),
    }
}

fn layout_error(node: &Node, reason: impl Into<String>) -> CompileError {
    CompileError::Layout { widget: node.widget.clone(), reason: reason.into(), pos: node.pos }
}

fn toolkit_error(node: &Node, source: ToolkitError) -> CompileError {
    CompileError::Toolkit { widget: node.widget.clone(), pos: node.pos, source }
}

fn resolve_error(widget: &str, opt: &Opt, e: ResolveError) -> CompileError {
    match e {
        ResolveError::Invalid(reason) => ValueError {
            widget: widget.to_string(),
            option: opt.key.clone(),
            raw: opt.value.clone(),
            reason,
            pos: opt.pos,
        }
        .into(),
        ResolveError::Undeclared { identifier, target } => ReferenceError {
            widget: widget.to_string(),
            reason: format!("no {target} named `{identifier}`"),
            identifier,
            pos: opt.pos,
        }
        .into(),
        ResolveError::Pending(identifier) => ReferenceError {
            widget: widget.to_string(),
            reason: format!("`@{identifier}` is declared further down the document"),
            identifier,
            pos: opt.pos,
        }
        .into(),
        ResolveError::Toolkit(source) => {
            CompileError::Toolkit { widget: widget.to_string(), pos: opt.pos, source }
        }
    }
}
