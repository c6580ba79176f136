mod diagnostics;

pub use diagnostics::{CompileError, Diagnostics, ErrorKind, Message};
