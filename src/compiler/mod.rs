mod blocks;
mod commands;
mod preprocessor;
mod types;

use std::path::Path;

use tracing::debug;

pub use commands::parse_commands;
pub use preprocessor::{preprocess, remove_continuations, strip_comments, Preprocessed};
pub use types::{origin_of, Block, Command, IncludeSpan, SourceBuffer};

use crate::diag::{CompileError, Diagnostics, ErrorKind};

/// Compile one tech unit: preprocess, segment into blocks, and parse each
/// block body into commands.
///
/// Include problems are reported into `diag` and skipped; a malformed
/// header drops only that block. An unmatched brace is fatal to the whole
/// unit and returned as `Err`.
pub fn compile_unit(
    text: &str,
    base_dir: &Path,
    diag: &mut Diagnostics,
) -> Result<Vec<Block>, CompileError> {
    let pre = preprocess(text, base_dir, diag);
    let raw = blocks::segment(&pre.buffer)?;

    let mut out = Vec::with_capacity(raw.len());
    for rb in raw {
        let tokens = blocks::header_tokens(&rb.header);
        if tokens.len() < 2 {
            diag.add(
                ErrorKind::Reference,
                format!("Ill defined block header '{}'.", rb.header.trim()),
            );
            continue;
        }
        let type_token = tokens[0].clone();
        let name_token = tokens[tokens.len() - 1].clone();
        let annotation_token = if tokens.len() > 2 {
            Some(tokens[tokens.len() - 2].clone())
        } else {
            None
        };

        let (origin_file, line, column_offset) = blocks::locate(&pre.buffer, &pre.includes, rb.start);
        let commands = parse_commands(&rb.body);

        debug!(
            kind = %type_token,
            name = %name_token,
            line,
            commands = commands.len(),
            "block accepted"
        );

        out.push(Block {
            origin_file,
            line,
            column_offset,
            type_token,
            annotation_token,
            name_token,
            body: rb.body,
            commands,
        });
    }

    Ok(out)
}
