mod session;
mod settings;

pub use session::{DebugSession, TraceRecord, TraceSession};
pub use settings::{DebugSettings, Invocation};
