use thiserror::Error;
use tkdocs_markup::{SourcePos, SyntaxError};

use crate::toolkit::ToolkitError;

/// An option value that does not fit its registered kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{pos}: invalid value `{raw}` for `{widget}.{option}`: {reason}")]
pub struct ValueError {
    pub widget: String,
    pub option: String,
    pub raw: String,
    pub reason: String,
    pub pos: SourcePos,
}

/// An identifier that names nothing: an undeclared `@reference`, an unbound
/// callback, or a `key` declared twice.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{pos}: `{widget}` refers to `{identifier}`: {reason}")]
pub struct ReferenceError {
    pub widget: String,
    pub identifier: String,
    pub reason: String,
    pub pos: SourcePos,
}

/// Coarse category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    UnknownWidget,
    UnknownOption,
    Value,
    Reference,
    InvalidRoot,
    NestedRoot,
    Layout,
    Toolkit,
}

/// Anything that stops a document from becoming a widget tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("{pos}: unknown widget type `{widget}`")]
    UnknownWidget { widget: String, pos: SourcePos },

    #[error("{pos}: `{widget}` has no option `{option}`")]
    UnknownOption {
        widget: String,
        option: String,
        pos: SourcePos,
    },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("{pos}: root widget `{widget}` is not a top-level window")]
    InvalidRoot { widget: String, pos: SourcePos },

    #[error("{pos}: top-level window `{widget}` can only be the root")]
    NestedRoot { widget: String, pos: SourcePos },

    #[error("{pos}: bad layout on `{widget}`: {reason}")]
    Layout {
        widget: String,
        reason: String,
        pos: SourcePos,
    },

    #[error("{pos}: toolkit failed on `{widget}`: {source}")]
    Toolkit {
        widget: String,
        pos: SourcePos,
        #[source]
        source: ToolkitError,
    },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Syntax(_) => ErrorKind::Syntax,
            CompileError::UnknownWidget { .. } => ErrorKind::UnknownWidget,
            CompileError::UnknownOption { .. } => ErrorKind::UnknownOption,
            CompileError::Value(_) => ErrorKind::Value,
            CompileError::Reference(_) => ErrorKind::Reference,
            CompileError::InvalidRoot { .. } => ErrorKind::InvalidRoot,
            CompileError::NestedRoot { .. } => ErrorKind::NestedRoot,
            CompileError::Layout { .. } => ErrorKind::Layout,
            CompileError::Toolkit { .. } => ErrorKind::Toolkit,
        }
    }

    /// Where in the source the problem is.
    pub fn pos(&self) -> SourcePos {
        match self {
            CompileError::Syntax(e) => e.pos(),
            CompileError::Value(e) => e.pos,
            CompileError::Reference(e) => e.pos,
            CompileError::UnknownWidget { pos, .. }
            | CompileError::UnknownOption { pos, .. }
            | CompileError::InvalidRoot { pos, .. }
            | CompileError::NestedRoot { pos, .. }
            | CompileError::Layout { pos, .. }
            | CompileError::Toolkit { pos, .. } => *pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_position() {
        let e = CompileError::UnknownWidget { widget: "Spinner".into(), pos: SourcePos::new(3, 5) };
        assert_eq!(e.to_string(), "3:5: unknown widget type `Spinner`");
        assert_eq!(e.kind(), ErrorKind::UnknownWidget);
        assert_eq!(e.pos(), SourcePos::new(3, 5));
    }

    #[test]
    fn reference_error_names_widget_and_identifier() {
        let e: CompileError = ReferenceError {
            widget: "Button".into(),
            identifier: "doThing".into(),
            reason: "no callback named `doThing`".into(),
            pos: SourcePos::new(2, 26),
        }
        .into();
        let msg = e.to_string();
        assert!(msg.contains("Button") && msg.contains("doThing"), "{msg}");
        assert_eq!(e.kind(), ErrorKind::Reference);
    }
}
