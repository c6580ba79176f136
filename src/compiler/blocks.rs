use regex::Regex;

use super::types::{origin_of, IncludeSpan, SourceBuffer};
use crate::diag::CompileError;

/// One accepted top-level block before header tokenization: byte offsets
/// into the merged buffer plus the raw text including header and braces.
#[derive(Debug, Clone)]
pub struct RawBlock {
    /// Offset of the first header token.
    pub start: usize,
    /// Offset of the opening brace.
    pub open: usize,
    /// Offset one past the closing brace.
    pub end: usize,
    pub header: String,
    pub body: String,
}

/// Scan the text for balanced top-level `{...}` spans whose opening brace
/// is preceded by a `TYPE [ANNOTATION] NAME` header.
///
/// A single linear pass records every depth 0->1 `{` and its matching `}`;
/// nesting inside a span is allowed and ignored. A `}` with no open span
/// is fatal to the whole unit since position tracking is unreliable past
/// that point; the reported line is the 0-based count of preceding
/// newlines.
pub fn segment(buffer: &SourceBuffer) -> Result<Vec<RawBlock>, CompileError> {
    let text = &buffer.text;

    let mut depth: i32 = 0;
    let mut newline = 0usize;
    let mut opens: Vec<usize> = Vec::new();
    let mut closes: Vec<usize> = Vec::new();
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'\n' => newline += 1,
            b'{' => {
                if depth == 0 {
                    opens.push(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    closes.push(i);
                }
                if depth < 0 {
                    return Err(CompileError::Syntax {
                        line: newline,
                        message: "Unexpected occurrence of '}'.".to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    // A balanced span is a block only where the header pattern ends at its
    // opening brace.
    let header_re = Regex::new(r"(\w+\s*){2,3}\{").expect("pattern is valid");
    let mut blocks = Vec::new();
    for m in header_re.find_iter(text) {
        let open = m.end() - 1;
        if let Ok(idx) = opens.binary_search(&open) {
            // A span still open at end of text has no recorded close and
            // is simply not a block.
            let Some(&close) = closes.get(idx) else {
                continue;
            };
            blocks.push(RawBlock {
                start: m.start(),
                open,
                end: close + 1,
                header: text[m.start()..open].to_string(),
                body: text[open + 1..close].to_string(),
            });
        }
    }

    Ok(blocks)
}

/// Header tokens in order: `TYPE NAME` or `TYPE ANNOTATION NAME`.
pub fn header_tokens(header: &str) -> Vec<String> {
    let word_re = Regex::new(r"[\w.]+").expect("pattern is valid");
    word_re
        .find_iter(header)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Describe where a block starts: origin file (via the include spans),
/// 1-based line within that file, and the byte offset within its line.
pub fn locate(
    buffer: &SourceBuffer,
    spans: &[IncludeSpan],
    offset: usize,
) -> (Option<std::path::PathBuf>, usize, usize) {
    let merged_line = buffer.line_of(offset);
    let column = offset - buffer.line_start(offset);
    match origin_of(spans, offset) {
        Some(span) => {
            let span_line = buffer.line_of(span.start);
            (Some(span.path.clone()), merged_line - span_line + 1, column)
        }
        None => (None, merged_line + 1, column),
    }
}
