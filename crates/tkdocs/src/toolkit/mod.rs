//! The seam between the compiler and a native GUI toolkit.
//!
//! The compiler never creates widgets itself; it drives a [`Toolkit`]
//! through widget builders and option setters. [`HeadlessToolkit`] is an
//! in-memory implementation used by tests and the CLI.

mod headless;

use std::fmt;

use thiserror::Error;

use crate::value::{Callback, Value};

pub use headless::{HeadlessToolkit, HeadlessWidget};

/// Opaque id of a live widget, issued by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetHandle(pub u64);

impl fmt::Display for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque id of a shared toolkit variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableHandle(pub u64);

impl fmt::Display for VariableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$var{}", self.0)
    }
}

/// Element type of a shared toolkit variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Int,
    Float,
    Bool,
    Str,
}

impl VarKind {
    /// The value a fresh variable holds.
    pub fn initial(self) -> Value {
        match self {
            VarKind::Int => Value::Int(0),
            VarKind::Float => Value::Float(0.0),
            VarKind::Bool => Value::Bool(false),
            VarKind::Str => Value::Str(String::new()),
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarKind::Int => "integer",
            VarKind::Float => "float",
            VarKind::Bool => "boolean",
            VarKind::Str => "string",
        })
    }
}

// ── Layout ────────────────────────────────────────────────────────────────

/// Geometry manager that places a widget inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutManager {
    #[default]
    Pack,
    Grid,
    Place,
}

impl LayoutManager {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pack" => Some(LayoutManager::Pack),
            "grid" => Some(LayoutManager::Grid),
            "place" => Some(LayoutManager::Place),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutManager::Pack => "pack",
            LayoutManager::Grid => "grid",
            LayoutManager::Place => "place",
        }
    }
}

impl fmt::Display for LayoutManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a widget is attached to its parent: the manager plus its parameters
/// in declared order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub manager: LayoutManager,
    pub params: Vec<(String, Value)>,
}

impl Layout {
    pub fn new(manager: LayoutManager) -> Self {
        Self { manager, params: Vec::new() }
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAxis {
    Row,
    Column,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Failure reported by a toolkit call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolkitError {
    #[error("toolkit has no widget kind `{0}`")]
    UnknownKind(String),
    #[error("no live widget {0}")]
    NoSuchWidget(WidgetHandle),
    #[error("no live variable {0}")]
    NoSuchVariable(VariableHandle),
    #[error("cannot set `{property}` on {widget}: {reason}")]
    Property {
        widget: WidgetHandle,
        property: String,
        reason: String,
    },
    #[error("{0}")]
    Other(String),
}

// ── Toolkit ───────────────────────────────────────────────────────────────

/// Operations the compiler needs from a native GUI toolkit.
///
/// Handles are only meaningful to the toolkit that issued them. Destroying a
/// widget destroys all of its descendants.
pub trait Toolkit {
    /// Create a widget of toolkit `kind` under `parent` (`None` for a
    /// top-level window).
    fn create_widget(
        &mut self,
        kind: &str,
        parent: Option<WidgetHandle>,
    ) -> Result<WidgetHandle, ToolkitError>;

    fn set_property(
        &mut self,
        widget: WidgetHandle,
        name: &str,
        value: &Value,
    ) -> Result<(), ToolkitError>;

    /// Register `callback` to run when `event` fires on `widget`.
    fn bind_event(
        &mut self,
        widget: WidgetHandle,
        event: &str,
        callback: Callback,
    ) -> Result<(), ToolkitError>;

    /// Place `widget` inside its parent.
    fn attach(&mut self, widget: WidgetHandle, layout: &Layout) -> Result<(), ToolkitError>;

    /// Give row or column `index` of a grid container a stretch weight.
    fn configure_grid(
        &mut self,
        _container: WidgetHandle,
        _axis: GridAxis,
        _index: usize,
        _weight: u32,
    ) -> Result<(), ToolkitError> {
        Ok(())
    }

    fn create_variable(&mut self, kind: VarKind) -> Result<VariableHandle, ToolkitError>;

    /// Release a variable. Destroying widgets never releases the variables
    /// they were bound to.
    fn destroy_variable(&mut self, var: VariableHandle) -> Result<(), ToolkitError>;

    /// Destroy `widget` and everything below it.
    fn destroy(&mut self, widget: WidgetHandle) -> Result<(), ToolkitError>;

    /// Hand control to the toolkit until `root` is closed.
    fn run_event_loop(&mut self, root: WidgetHandle) -> Result<(), ToolkitError>;
}
