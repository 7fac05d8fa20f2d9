//! TkinDocs: compile `.tkd` markup into a live widget tree.
//!
//! Parsing lives in `tkdocs-markup`; this crate owns everything that needs a
//! vocabulary or a toolkit: the [`Registry`](registry::Registry) of widget
//! types and options, value resolution, callback bindings, and the
//! [`TreeBuilder`](builder::TreeBuilder) that drives a [`Toolkit`](toolkit::Toolkit).
//!
//! # Quick start
//!
//! ```rust
//! use tkdocs::prelude::*;
//!
//! let mut tk = HeadlessToolkit::new();
//! let compiler = Compiler::new().on_event("doThing", |ev| println!("{} on {}", ev.name, ev.widget));
//! let tree = compiler
//!     .compile(&mut tk, "Window title=\"Hello\"\n    Button label=\"Click\" onClick=doThing\n")
//!     .unwrap();
//!
//! let button = tk.widget(tree.root()).unwrap().children[0];
//! tk.fire(button, "click");
//! ```
//!
//! # Extending the vocabulary
//!
//! New widget types and options are registered, never parsed specially:
//!
//! ```rust
//! use tkdocs::prelude::*;
//!
//! let compiler = Compiler::new()
//!     .widget("Gauge", |tk, parent| tk.create_widget("progressbar", parent))
//!     .unwrap()
//!     .option("Gauge", "level", ValueKind::Float, |tk, h, v| tk.set_property(h, "value", v))
//!     .unwrap();
//! # let mut tk = HeadlessToolkit::new();
//! # compiler.compile(&mut tk, "Window\n    Gauge level=0.5\n").unwrap();
//! ```

pub mod bindings;
pub mod builder;
mod builtins;
pub mod compiler;
pub mod error;
pub mod logging;
pub mod registry;
pub mod resolve;
pub mod toolkit;
pub mod value;

pub use compiler::{compile, Compiler, CompilerConfig};
pub use error::{CompileError, ErrorKind};

/// The types most callers need.
pub mod prelude {
    pub use crate::bindings::{Bindings, EventQueue};
    pub use crate::builder::WidgetTree;
    pub use crate::compiler::{compile, Compiler, CompilerConfig};
    pub use crate::error::{CompileError, ErrorKind, ReferenceError, ValueError};
    pub use crate::registry::{Registry, RegistrationError};
    pub use crate::toolkit::{
        GridAxis, HeadlessToolkit, Layout, LayoutManager, Toolkit, ToolkitError, VarKind,
        VariableHandle, WidgetHandle,
    };
    pub use crate::value::{Callback, Event, Value, ValueKind};

    pub use tkdocs_markup::{Document, SourcePos};
}
