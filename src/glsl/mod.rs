mod transpiler;
mod watch;

pub use transpiler::{transpile, TranspiledSource};
pub use watch::{process_watches, stage_selector};

use serde::{Deserialize, Serialize};

/// One shading-language program unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl StageKind {
    /// Map a block annotation to its stage.
    pub fn from_annotation(anno: &str) -> Option<Self> {
        match anno {
            "vert" => Some(Self::Vertex),
            "tess" => Some(Self::TessControl),
            "eval" => Some(Self::TessEval),
            "geom" => Some(Self::Geometry),
            "frag" => Some(Self::Fragment),
            "comp" => Some(Self::Compute),
            _ => None,
        }
    }

    /// Host base class the transpiled code derives from.
    pub fn base_class(&self) -> &'static str {
        match self {
            Self::Vertex => "VertShader",
            Self::TessControl => "TessShader",
            Self::TessEval => "EvalShader",
            Self::Geometry => "GeomShader",
            Self::Fragment => "FragShader",
            Self::Compute => "CompShader",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Vertex => 0,
            Self::TessControl => 1,
            Self::TessEval => 2,
            Self::Geometry => 3,
            Self::Fragment => 4,
            Self::Compute => 5,
        }
    }
}

/// Find the byte offset one past the brace matching `text[open]`.
/// Returns `None` when the text ends before the brace closes.
pub(crate) fn match_brace(text: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(text.as_bytes()[open], b'{');
    let mut depth = 0i32;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
