use regex::{Captures, Regex};

use super::{match_brace, StageKind};

/// Host-language source produced from one shader, plus the variable names
/// the instrumented code can surface, in first-seen order.
#[derive(Debug, Clone)]
pub struct TranspiledSource {
    pub host_text: String,
    pub traceable: Vec<String>,
}

/// Numeric type names whose casts get grouped and whose occurrences are
/// never wrapped in trace calls.
const CAST_TYPES: [&str; 5] = ["bool", "int", "uint", "float", "double"];

/// Known built-in type names, control keywords and host keywords the
/// debug pass must not wrap.
const SKIP_WORDS: [&str; 42] = [
    "bool", "int", "uint", "float", "double",
    "bvec2", "ivec2", "uvec2", "vec2", "dvec2",
    "bvec3", "ivec3", "uvec3", "vec3", "dvec3",
    "bvec4", "ivec4", "uvec4", "vec4", "dvec4",
    "mat2", "dmat2", "mat3", "dmat3", "mat4", "dmat4",
    "return", "new", "if", "else", "for", "while", "do",
    "break", "continue", "discard", "true", "false",
    "public", "class", "get", "object",
];

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern is valid")
}

/// Apply `f` to every match, right to left, so earlier replacements never
/// invalidate the offsets of later matches.
fn rewrite_rtl(text: &str, re: &Regex, mut f: impl FnMut(&Captures) -> String) -> String {
    let caps: Vec<Captures> = re.captures_iter(text).collect();
    let mut out = text.to_string();
    for cap in caps.iter().rev() {
        let m = cap.get(0).expect("whole match");
        let replacement = f(cap);
        out.replace_range(m.range(), &replacement);
    }
    out
}

/// Convert shading-language source into instrumented host-language class
/// source through an explicitly ordered sequence of textual rewrites.
/// Deterministic for identical input.
pub fn transpile(stage: StageKind, text: &str, inject_debug: bool) -> TranspiledSource {
    let mut traceable = Vec::new();

    let text = strip_version(text);
    let text = group_typecasts(&text);
    let text = inout_layouts(&text);
    let text = layouts(&text);
    let text = constants(&text);
    let text = interface_blocks(&text);
    let text = arrays(&text);
    let text = strip_uniform(&text);
    let text = discard_to_return(&text);
    let text = if inject_debug {
        inject_trace(&text, &mut traceable)
    } else {
        text
    };
    let text = float_suffixes(&text);
    let text = input_varyings(&text);
    let text = predefined_outputs(&text);
    let text = output_qualifiers(&text);
    let text = main_signature(&text, stage);

    TranspiledSource {
        host_text: text,
        traceable,
    }
}

/// Pass 1: drop the `#version NNN` directive.
fn strip_version(text: &str) -> String {
    rx(r"#version [0-9]{3}").replace_all(text, "").into_owned()
}

/// Pass 2: group numeric casts so target and argument list read as one
/// expression: `int(x)` becomes `(int)(x)`.
fn group_typecasts(text: &str) -> String {
    let mut out = text.to_string();
    for ty in CAST_TYPES {
        let re = rx(&format!(r"\b{ty}\(.*\)"));
        out = rewrite_rtl(&out, &re, |cap| {
            let m = cap.get(0).expect("whole match").as_str();
            format!("({ty}){}", &m[ty.len()..])
        });
    }
    out
}

/// Pass 3: standalone `layout(...) in;` / `layout(...) out;` declarations
/// become typed placeholder declarations keeping the layout parameters.
fn inout_layouts(text: &str) -> String {
    let mut out = text.to_string();
    for q in ["in", "out"] {
        let re = rx(&format!(r"\blayout\s*\(.*?\)\s+{q}\s*;"));
        let qre = rx(&format!(r"\b{q}\b"));
        out = rewrite_rtl(&out, &re, |cap| {
            let m = cap.get(0).expect("whole match").as_str();
            qre.replace_all(m, format!("object __{q}__").as_str())
                .into_owned()
        });
    }
    out
}

/// Pass 4: remaining `layout(...)` qualifiers become attribute-like
/// annotations carrying the same parameters.
fn layouts(text: &str) -> String {
    let re = rx(r"\blayout\s*\(.*?\)");
    rewrite_rtl(text, &re, |cap| {
        format!("[__{}]", cap.get(0).expect("whole match").as_str())
    })
}

/// Pass 5: `const TYPE NAME = VALUE;` becomes a read-only computed
/// property; any remaining bare `const` qualifier is dropped.
fn constants(text: &str) -> String {
    let re = rx(r"\bconst\s+(\w+)\s+([\w\d]+)\s*=\s*([\w\d.]+)\s*;");
    let out = rewrite_rtl(text, &re, |cap| {
        format!("{} {} {{ get {{ return {}; }} }}", &cap[1], &cap[2], &cap[3])
    });
    rx(r"\bconst\b").replace_all(&out, "").into_owned()
}

/// Pass 6: `uniform Name { fields } inst;` style interface blocks become
/// nested value-type classes with public members and an inline constructed
/// instance. Array instances infer their length from `[]` or `[N]`.
fn interface_blocks(text: &str) -> String {
    let re = rx(r"(?s)\b([\w\d]+)\s+([\w\d]+)\s*\{(.*?)\}\s*([\w\d]+)\s*(\[(.*?)\])?\s*;");
    let field_re = rx(r"\b[\w\d_]+\s+[\w\d\[\]_]+\s*;");
    rewrite_rtl(text, &re, |cap| {
        let name = &cap[2];
        let inst = &cap[4];
        let fields = field_re.replace_all(&cap[3], "public ${0}");
        match cap.get(6) {
            Some(dim) => {
                let d = dim.as_str().trim();
                let d = if d.is_empty() { "0" } else { d };
                format!("class {name} {{{fields}}} {name}[] {inst} = new {name}[{d}];")
            }
            None => format!("class {name} {{{fields}}} {name} {inst} = new {name}();"),
        }
    })
}

/// Pass 7: `TYPE NAME[DIM];` becomes `TYPE[] NAME = new TYPE[DIM];`.
fn arrays(text: &str) -> String {
    let re = rx(r"\b([\w\d]+)\s+([\w\d]+)\s*\[(.*?)\]\s*;");
    rewrite_rtl(text, &re, |cap| {
        let ty = &cap[1];
        if ty == "new" {
            return cap.get(0).expect("whole match").as_str().to_string();
        }
        format!("{ty}[] {} = new {ty}[{}];", &cap[2], &cap[3])
    })
}

/// Pass 8: uniform access becomes implicit, the qualifier is dropped.
fn strip_uniform(text: &str) -> String {
    rx(r"\buniform\b").replace_all(text, "").into_owned()
}

/// Pass 9: `discard` becomes the host `return`; transpiled code always
/// sits inside a routine with no meaningful post-discard work.
fn discard_to_return(text: &str) -> String {
    rx(r"\bdiscard\b").replace_all(text, "return").into_owned()
}

/// Pass 11: float literals without a suffix get one.
fn float_suffixes(text: &str) -> String {
    let re = rx(r"\b[0-9]*\.[0-9]+\b");
    rewrite_rtl(text, &re, |cap| {
        format!("{}f", cap.get(0).expect("whole match").as_str())
    })
}

/// Pass 12: single input varyings become computed properties reading the
/// previous stage's output by name.
fn input_varyings(text: &str) -> String {
    let re = rx(r"\bin\s+([\w\d]+)\s+([\w\d]+)\s*;");
    rewrite_rtl(text, &re, |cap| {
        let ty = &cap[1];
        let name = &cap[2];
        format!("[__in] {ty} {name} {{ get {{ return get_input_varying(\"{name}\"); }} }}")
    })
}

/// Pass 13: the predefined `out gl_PerVertex { ... };` block is stripped,
/// preserving its line count.
fn predefined_outputs(text: &str) -> String {
    let re = rx(r"(?s)\bout\s+gl_PerVertex\s*\{.*?\};");
    rewrite_rtl(text, &re, |cap| {
        let m = cap.get(0).expect("whole match").as_str();
        "\n".repeat(m.bytes().filter(|&b| b == b'\n').count())
    })
}

/// Pass 14: stage-output and interpolation qualifiers become attribute
/// markers.
fn output_qualifiers(text: &str) -> String {
    let out = rx(r"\bout\b").replace_all(text, "[__out]").into_owned();
    let out = rx(r"\bflat\b").replace_all(&out, "[__flat]").into_owned();
    rx(r"\bsmooth\b").replace_all(&out, "[__smooth]").into_owned()
}

/// Pass 15: rename the entry point into the host override signature for
/// the stage's base class.
fn main_signature(text: &str, _stage: StageKind) -> String {
    rx(r"\bvoid\s+main\b")
        .replace_all(text, "public override void main")
        .into_owned()
}

/// Pass 10: wrap candidate variable and member-access expressions inside
/// every function body in a trace call carrying the expression text.
///
/// Matches are processed right to left so nested accesses are wrapped
/// outermost-last. An expression is skipped when it is a known type name
/// or keyword, a numeric literal, declared right after a type name, or is
/// immediately followed by an assignment/increment operator or an opening
/// parenthesis.
fn inject_trace(text: &str, traceable: &mut Vec<String>) -> String {
    let func_re = rx(r"\b[\w\d\[\]]+\s+[\w\d]+\s*\([^)]*\)\s*\{");
    let part = r"\b[\w\d]+\b\s*(?:\[[^\[\]]*\])?";
    let var_re = rx(&format!(r"{part}(?:\s*\.\s*{part})*"));
    let follow_re = rx(r"^\s*(=|\*=|/=|\+=|-=|\+\+|--|\()");

    // Brace depth at every function-head match decides whether it is a
    // real top-level function or a nested statement block; only top-level
    // bodies are rewritten so their ranges stay disjoint.
    let depth_at = |t: &str, pos: usize| -> i32 {
        let mut depth = 0;
        for b in t[..pos].bytes() {
            match b {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
        }
        depth
    };

    let mut seen: Vec<(usize, String)> = Vec::new();
    let mut out = text.to_string();
    let funcs: Vec<(usize, usize)> = func_re
        .find_iter(text)
        .filter(|m| depth_at(text, m.start()) == 0)
        .filter_map(|m| {
            let open = m.end() - 1;
            match_brace(text, open).map(|end| (open, end))
        })
        .collect();

    for &(open, end) in funcs.iter().rev() {
        let body = &text[open..end];
        let mut new_body = body.to_string();
        let vars: Vec<_> = var_re.find_iter(body).collect();
        for v in vars.iter().rev() {
            let expr = v.as_str();
            let label = expr.trim();

            if SKIP_WORDS.contains(&label) || label.parse::<f64>().is_ok() {
                continue;
            }
            if follow_re.is_match(&body[v.end()..]) {
                continue;
            }
            if preceding_word(body, v.start())
                .map(|w| SKIP_WORDS.contains(&w))
                .unwrap_or(false)
            {
                continue;
            }

            new_body.replace_range(v.range(), &format!("trace_var({expr}, \"{label}\")"));
            seen.push((open + v.start(), label.to_string()));
        }
        out.replace_range(open..end, &new_body);
    }

    seen.sort_by_key(|(pos, _)| *pos);
    for (_, name) in seen {
        if !traceable.contains(&name) {
            traceable.push(name);
        }
    }

    out
}

/// Word immediately before `pos`, separated only by whitespace.
fn preceding_word(text: &str, pos: usize) -> Option<&str> {
    let head = text[..pos].trim_end();
    let start = head
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map(|i| i + 1)
        .unwrap_or(0);
    if start < head.len() {
        Some(&head[start..])
    } else {
        None
    }
}
