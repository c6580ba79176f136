use regex::Regex;

use super::{match_brace, StageKind};

/// Locate `<<<expr>>>` watch markers inside the entry point's body and
/// either strip them (non-debug build) or replace each with a store call
/// at a monotonically increasing watch index. The index counter is shared
/// across the whole compile session and reset only when a new debug
/// session begins.
pub fn process_watches(text: &str, debug: bool, watch_index: &mut u32) -> String {
    let main_re = Regex::new(r"void\s+main\s*\(\s*\)").expect("pattern is valid");
    let watch_re = Regex::new(r"<<<[\w\d_.\[\]]*>>>").expect("pattern is valid");

    let Some(main) = main_re.find(text) else {
        return text.to_string();
    };
    let Some(open_rel) = text[main.end()..].find('{') else {
        return text.to_string();
    };
    let open = main.end() + open_rel;
    let Some(end) = match_brace(text, open) else {
        return text.to_string();
    };

    let body = &text[open..end];
    let mut new_body = body.to_string();
    let markers: Vec<_> = watch_re.find_iter(body).collect();
    for m in markers.iter().rev() {
        let replacement = if debug {
            let expr = &m.as_str()[3..m.as_str().len() - 3];
            let idx = *watch_index;
            *watch_index += 1;
            format!("_dbg_idx = _dbg_store(_dbg_idx, {expr}, {idx});")
        } else {
            String::new()
        };
        new_body.replace_range(m.range(), &replacement);
    }

    let mut out = text.to_string();
    out.replace_range(open..end, &new_body);
    out
}

/// Per-stage invocation selector: the uniform declaration an instrumented
/// shader carries and the condition deciding whether the current GPU
/// invocation is the one the user wants to inspect.
pub fn stage_selector(stage: StageKind) -> (&'static str, &'static str) {
    match stage {
        StageKind::Vertex => (
            "ivec2 _dbg_vert",
            "all(equal(_dbg_vert, ivec2(gl_InstanceID, gl_VertexID)))",
        ),
        StageKind::TessControl => (
            "ivec2 _dbg_tess",
            "all(equal(_dbg_tess, ivec2(gl_InvocationID, gl_PrimitiveID)))",
        ),
        StageKind::TessEval => ("int _dbg_eval", "_dbg_eval == gl_PrimitiveID"),
        StageKind::Geometry => (
            "ivec2 _dbg_geom",
            "all(equal(_dbg_geom, ivec2(gl_PrimitiveIDIn, gl_InvocationID)))",
        ),
        StageKind::Fragment => (
            "ivec4 _dbg_frag",
            "all(equal(_dbg_frag, ivec4(int(gl_FragCoord.x), int(gl_FragCoord.y), gl_Layer, gl_ViewportIndex)))",
        ),
        StageKind::Compute => (
            "uvec3 _dbg_comp",
            "all(equal(_dbg_comp, gl_GlobalInvocationID))",
        ),
    }
}
