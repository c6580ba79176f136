use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use super::types::{IncludeSpan, SourceBuffer};
use crate::diag::{Diagnostics, ErrorKind};

/// Output of preprocessing: merged text with valid line offsets, plus the
/// include spans attributing byte ranges back to their origin files.
#[derive(Debug)]
pub struct Preprocessed {
    pub buffer: SourceBuffer,
    pub includes: Vec<IncludeSpan>,
}

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern is valid")
}

/// Replace every byte of `range` with a blank of equal length so that all
/// later offsets stay valid. Newlines are preserved to keep the line count
/// unchanged.
fn blank_range(text: &mut String, start: usize, end: usize, keep_newlines: bool) {
    let blanked: String = text[start..end]
        .bytes()
        .map(|b| {
            if keep_newlines && b == b'\n' {
                '\n'
            } else {
                ' '
            }
        })
        .collect();
    text.replace_range(start..end, &blanked);
}

/// Pass 1: blank `/*...*/` and `//...` spans, preserving length and line
/// count. Double-quoted and verbatim string literals are matched by the
/// same alternation and kept as they are, so comment delimiters inside
/// them are never touched.
pub fn strip_comments(text: &str) -> String {
    let re = rx(r#"(?s)/\*.*?\*/|//[^\n]*|"(\\[^\n]|[^"\n])*"|@("[^"]*")+"#);
    let mut out = text.to_string();
    let matches: Vec<_> = re.find_iter(text).map(|m| m.range()).collect();
    for range in matches.into_iter().rev() {
        if text[range.clone()].starts_with("/*") || text[range.clone()].starts_with("//") {
            blank_range(&mut out, range.start, range.end, true);
        }
    }
    out
}

/// Pass 2: a line ending in `...` (plus optional trailing whitespace) is a
/// soft line break. The marker and its newline are blanked so the two
/// physical lines form one logical line while every byte offset stays put.
pub fn remove_continuations(text: &str) -> String {
    let re = rx(r"\.\.\.[ \t]*\r?\n");
    let mut out = text.to_string();
    let matches: Vec<_> = re.find_iter(text).map(|m| m.range()).collect();
    for range in matches.into_iter().rev() {
        blank_range(&mut out, range.start, range.end, false);
    }
    out
}

/// Passes 1-3 applied to one file's content: comment and continuation
/// blanking followed by recursive include expansion (each included file is
/// preprocessed the same way, with its own directory as the new base).
fn expand(
    text: &str,
    base_dir: &Path,
    stack: &mut Vec<PathBuf>,
    diag: &mut Diagnostics,
) -> (String, Vec<IncludeSpan>) {
    let cleaned = remove_continuations(&strip_comments(text));

    let re = rx(r#"(?m)^[ \t]*#include[ \t]+"([^"\n]*)""#);
    let directives: Vec<(std::ops::Range<usize>, String)> = re
        .captures_iter(&cleaned)
        .map(|cap| {
            let m = cap.get(0).expect("whole match");
            (m.range(), cap[1].to_string())
        })
        .collect();

    let mut out = cleaned;
    let mut spans: Vec<IncludeSpan> = Vec::new();
    // Every splice changes the buffer length, so all later directive
    // positions are corrected by the growing offset.
    let mut correction: isize = 0;

    for (range, incfile) in directives {
        let resolved = if Path::new(&incfile).is_absolute() {
            PathBuf::from(&incfile)
        } else {
            base_dir.join(&incfile)
        };

        if stack.contains(&resolved) {
            diag.add(
                ErrorKind::Reference,
                format!("The include file '{incfile}' is included recursively."),
            );
            continue;
        }

        let content = match fs::read_to_string(&resolved) {
            Ok(content) => content,
            Err(_) => {
                diag.add(
                    ErrorKind::Reference,
                    format!("The include file '{incfile}' could not be found."),
                );
                continue;
            }
        };

        let inc_dir = resolved.parent().unwrap_or(Path::new(".")).to_path_buf();
        stack.push(resolved.clone());
        let (expanded, inner) = expand(&content, &inc_dir, stack, diag);
        stack.pop();

        let start = (range.start as isize + correction) as usize;
        let end = (range.end as isize + correction) as usize;
        out.replace_range(start..end, &expanded);
        correction += expanded.len() as isize - range.len() as isize;

        debug!(file = %resolved.display(), bytes = expanded.len(), "include expanded");
        push_spans(&mut spans, &resolved, start, expanded.len(), inner);
    }

    (out, spans)
}

/// Record the span of one inserted include. Regions contributed by nested
/// includes keep their own attribution; the remaining gaps belong to the
/// directly included file. Keeps the span table disjoint and ordered.
fn push_spans(
    spans: &mut Vec<IncludeSpan>,
    path: &Path,
    base: usize,
    len: usize,
    inner: Vec<IncludeSpan>,
) {
    let mut cursor = base;
    for mut span in inner {
        span.start += base;
        span.end += base;
        if cursor < span.start {
            spans.push(IncludeSpan {
                path: path.to_path_buf(),
                start: cursor,
                end: span.start,
            });
        }
        cursor = span.end;
        spans.push(span);
    }
    if cursor < base + len {
        spans.push(IncludeSpan {
            path: path.to_path_buf(),
            start: cursor,
            end: base + len,
        });
    }
}

/// Pass 4: `#global KEY VALUE` defines a literal text substitution. The
/// directive is blanked, then every later occurrence of KEY in the buffer
/// is replaced by VALUE. This is byte-level substring replacement with no
/// identifier-boundary check and no string-literal protection; downstream
/// tech files depend on exactly this behavior.
fn apply_globals(text: &mut String, spans: &mut [IncludeSpan], _diag: &mut Diagnostics) {
    let re = rx(r"(?m)^[ \t]*#global[ \t]+(\S+)[ \t]+(\S+)");
    loop {
        let (range, key, value) = match re.captures(text) {
            Some(cap) => {
                let m = cap.get(0).expect("whole match");
                (m.range(), cap[1].to_string(), cap[2].to_string())
            }
            None => break,
        };

        blank_range(text, range.start, range.end, false);

        let delta = value.len() as isize - key.len() as isize;
        let mut search = range.end;
        while let Some(idx) = text[search..].find(&key) {
            let at = search + idx;
            text.replace_range(at..at + key.len(), &value);
            for span in spans.iter_mut() {
                if span.start > at {
                    span.start = (span.start as isize + delta) as usize;
                }
                if span.end > at {
                    span.end = (span.end as isize + delta) as usize;
                }
            }
            search = at + value.len();
        }
    }
}

/// Full preprocessing pipeline: comment removal, continuation removal,
/// recursive include expansion and macro substitution, in that order.
///
/// A missing or cyclic include is reported into `diag` and skipped; the
/// rest of the unit is still processed.
pub fn preprocess(text: &str, base_dir: &Path, diag: &mut Diagnostics) -> Preprocessed {
    let mut stack = Vec::new();
    let (mut merged, mut spans) = expand(text, base_dir, &mut stack, diag);
    apply_globals(&mut merged, &mut spans, diag);

    Preprocessed {
        buffer: SourceBuffer::new(merged),
        includes: spans,
    }
}
