use std::fmt;

use thiserror::Error;

/// Category of a compile problem. Decides how far the failure propagates:
/// syntax errors abort the whole unit, everything else is scoped to the
/// object being constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unmatched brace or malformed block header; position tracking is
    /// unreliable past this point.
    Syntax,
    /// Unknown object kind, duplicate name, missing include, unresolved
    /// name reference between objects.
    Reference,
    /// Wrong command arity, unconvertible argument, unknown field name.
    Field,
    /// Failure surfaced by a backend service (e.g. dynamic compilation).
    External,
}

/// Failure returned once a construction attempt or unit compile gives up.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("FATAL ERROR in line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// All messages accumulated for one object, joined into one report.
    #[error("{0}")]
    Aggregate(String),
}

/// One recorded problem, prefix already applied.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: ErrorKind,
    pub text: String,
}

/// Error accumulator with hierarchical call context.
///
/// Labels pushed onto the context stack prefix every message added while
/// they are active (outermost first, each suffixed with `": "`). Messages
/// never interrupt construction on their own; the caller converts a
/// non-empty accumulator into a single aggregate failure at the end via
/// [`Diagnostics::into_result`].
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    context: Vec<String>,
    messages: Vec<Message>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator that starts inside the given context label.
    pub fn with_context(label: impl Into<String>) -> Self {
        let mut diag = Self::new();
        diag.push(label);
        diag
    }

    pub fn push(&mut self, label: impl Into<String>) {
        self.context.push(label.into());
    }

    pub fn pop(&mut self) {
        self.context.pop();
    }

    /// Functional push: a fresh accumulator whose context is this one's
    /// plus `label`. Safe to hand to sibling sub-calls; collect results
    /// back with [`Diagnostics::merge`].
    pub fn with(&self, label: impl Into<String>) -> Self {
        let mut child = Self {
            context: self.context.clone(),
            messages: Vec::new(),
        };
        child.push(label);
        child
    }

    fn prefix(&self) -> String {
        let mut str = String::new();
        for label in &self.context {
            str.push_str(label);
            str.push_str(": ");
        }
        str
    }

    /// Record a message under the current context. Never interrupts.
    pub fn add(&mut self, kind: ErrorKind, message: impl AsRef<str>) {
        self.messages.push(Message {
            kind,
            text: format!("{}{}", self.prefix(), message.as_ref()),
        });
    }

    /// Absorb all messages of a child accumulator. Prefixes have already
    /// been applied at add time, so this is a plain append.
    pub fn merge(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True if any recorded message is unit-fatal.
    pub fn has_syntax_errors(&self) -> bool {
        self.messages.iter().any(|m| m.kind == ErrorKind::Syntax)
    }

    /// One message per line, each terminated by a line break.
    pub fn text(&self) -> String {
        let mut str = String::new();
        for msg in &self.messages {
            str.push_str(&msg.text);
            str.push('\n');
        }
        str
    }

    /// Finish a construction attempt: empty accumulator passes the value
    /// through, otherwise all messages are raised as one failure.
    pub fn into_result<T>(self, value: T) -> Result<T, CompileError> {
        if self.has_errors() {
            Err(CompileError::Aggregate(self.text()))
        } else {
            Ok(value)
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
