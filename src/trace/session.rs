use std::fmt;
use std::fmt::Display;

use serde::Serialize;

use super::settings::{DebugSettings, Invocation};
use crate::glsl::StageKind;

/// One captured sample produced by instrumented code.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub line: i32,
    pub column: u32,
    pub label: String,
    pub output: String,
    pub inputs: Option<Vec<String>>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inputs {
            None => write!(
                f,
                "[L{}, C{}] {}: {}",
                self.line, self.column, self.label, self.output
            ),
            Some(inputs) => write!(
                f,
                "[L{}, C{}] {} = {}({})",
                self.line,
                self.column,
                self.output,
                self.label,
                inputs.join(", ")
            ),
        }
    }
}

/// Ordered trace log gated by a collecting flag.
///
/// While collecting is off, the trace calls return their first argument
/// unchanged and never touch the log, so instrumentation has zero
/// behavioral effect. The line-offset base established when entering a
/// traced invocation maps generated-code line numbers back to the shader
/// source.
#[derive(Debug, Default)]
pub struct TraceSession {
    collecting: bool,
    line_offset: i32,
    log: Vec<TraceRecord>,
}

impl TraceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable collection for one traced invocation.
    pub fn begin(&mut self, line_offset: i32) {
        self.collecting = true;
        self.line_offset = line_offset;
    }

    pub fn end(&mut self) {
        self.collecting = false;
        self.line_offset = 0;
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    pub fn log(&self) -> &[TraceRecord] {
        &self.log
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Record one variable sample. Passthrough when not collecting.
    pub fn trace_var<T: Display>(&mut self, value: T, label: &str, line: u32, column: u32) -> T {
        if self.collecting {
            self.log.push(TraceRecord {
                line: line as i32 + self.line_offset,
                column,
                label: label.to_string(),
                output: value.to_string(),
                inputs: None,
            });
        }
        value
    }

    /// Record one call sample with its inputs. Passthrough when not
    /// collecting.
    pub fn trace_call<T: Display>(
        &mut self,
        output: T,
        label: &str,
        inputs: &[String],
        line: u32,
        column: u32,
    ) -> T {
        if self.collecting {
            self.log.push(TraceRecord {
                line: line as i32 + self.line_offset,
                column,
                label: label.to_string(),
                output: output.to_string(),
                inputs: Some(inputs.to_vec()),
            });
        }
        output
    }

    /// The log as JSON for the external output surface.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.log)
    }
}

/// One debug session: the invocation selectors, the trace log, and the
/// watch index counter shared across the whole compile session.
#[derive(Debug, Default)]
pub struct DebugSession {
    pub settings: DebugSettings,
    pub trace: TraceSession,
    watch_count: u32,
}

impl DebugSession {
    pub fn new(settings: DebugSettings) -> Self {
        Self {
            settings,
            trace: TraceSession::new(),
            watch_count: 0,
        }
    }

    /// Reset the trace log and watch indexing for a fresh session.
    pub fn restart(&mut self) {
        self.trace.clear();
        self.watch_count = 0;
    }

    pub fn watch_count(&mut self) -> &mut u32 {
        &mut self.watch_count
    }

    /// Enable collection only when the current GPU invocation is the one
    /// selected in the settings. Returns whether collection was enabled;
    /// the caller ends the invocation with [`TraceSession::end`].
    pub fn begin_invocation(
        &mut self,
        stage: StageKind,
        invocation: &Invocation,
        line_offset: i32,
    ) -> bool {
        if self.settings.matches(stage, invocation) {
            self.trace.begin(line_offset);
            true
        } else {
            false
        }
    }
}
