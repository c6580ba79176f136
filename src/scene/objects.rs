use std::str::FromStr;

use super::{Builder, Scene, SceneObject};
use crate::compiler::{Block, Command};
use crate::diag::{Diagnostics, ErrorKind};
use crate::glsl::{process_watches, transpile, StageKind, TranspiledSource};

/// Bind a one-argument command to a typed field. All discoverable
/// problems are accumulated so a single compile attempt surfaces as many
/// messages as possible.
fn set_scalar<T: FromStr>(field: &mut T, cmd: &Command, diag: &mut Diagnostics) {
    if cmd.args.is_empty() {
        diag.add(
            ErrorKind::Field,
            format!(
                "Command '{}' has no arguments (must have at least one).",
                cmd.name
            ),
        );
        return;
    }
    if cmd.args.len() > 1 {
        diag.add(
            ErrorKind::Field,
            format!("Command '{}' has too many arguments (more than one).", cmd.name),
        );
        return;
    }
    match cmd.args[0].parse::<T>() {
        Ok(value) => *field = value,
        Err(_) => diag.add(
            ErrorKind::Field,
            format!(
                "Command '{}': could not convert argument '{}'.",
                cmd.name, cmd.args[0]
            ),
        ),
    }
}

/// Bind a variadic command to a list field; the arguments are kept as raw
/// strings.
fn set_list(field: &mut Vec<String>, cmd: &Command, diag: &mut Diagnostics) {
    if cmd.args.is_empty() {
        diag.add(
            ErrorKind::Field,
            format!(
                "Command '{}' has no arguments (must have at least one).",
                cmd.name
            ),
        );
        return;
    }
    field.clone_from(&cmd.args);
}

fn no_arguments(cmd: &Command, diag: &mut Diagnostics) {
    diag.add(
        ErrorKind::Field,
        format!(
            "Command '{}' has no arguments (must have at least one).",
            cmd.name
        ),
    );
}

fn unknown_field(cmd: &Command, diag: &mut Diagnostics) {
    diag.add(
        ErrorKind::Field,
        format!("Unknown field '{}'.", cmd.name),
    );
}

/// GPU data buffer.
#[derive(Debug, Default)]
pub struct Buffer {
    pub usage: String,
    pub size: i64,
    pub data: Vec<String>,
}

impl Buffer {
    pub fn create(
        block: &Block,
        _scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut buf = Buffer::default();
        for cmd in &block.commands {
            match cmd.name.to_lowercase().as_str() {
                "usage" => set_scalar(&mut buf.usage, cmd, diag),
                "size" => set_scalar(&mut buf.size, cmd, diag),
                "data" => set_list(&mut buf.data, cmd, diag),
                _ => unknown_field(cmd, diag),
            }
        }
        Some(SceneObject::Buffer(buf))
    }
}

/// Texture image. `size` is up to four values: width, height, depth,
/// array length.
#[derive(Debug, Default)]
pub struct Image {
    pub file: Vec<String>,
    pub size: Vec<String>,
    pub mipmaps: i64,
    pub kind: String,
    pub format: String,
}

impl Image {
    pub fn create(
        block: &Block,
        _scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut img = Image::default();
        for cmd in &block.commands {
            match cmd.name.to_lowercase().as_str() {
                "file" => set_list(&mut img.file, cmd, diag),
                "size" => set_list(&mut img.size, cmd, diag),
                "mipmaps" => set_scalar(&mut img.mipmaps, cmd, diag),
                "type" => set_scalar(&mut img.kind, cmd, diag),
                "format" => set_scalar(&mut img.format, cmd, diag),
                _ => unknown_field(cmd, diag),
            }
        }
        Some(SceneObject::Image(img))
    }
}

/// Texture sampling state.
#[derive(Debug, Default)]
pub struct Sampler {
    pub minfilter: String,
    pub magfilter: String,
    pub wrap: String,
}

impl Sampler {
    pub fn create(
        block: &Block,
        _scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut samp = Sampler::default();
        for cmd in &block.commands {
            match cmd.name.to_lowercase().as_str() {
                "minfilter" => set_scalar(&mut samp.minfilter, cmd, diag),
                "magfilter" => set_scalar(&mut samp.magfilter, cmd, diag),
                "wrap" => set_scalar(&mut samp.wrap, cmd, diag),
                _ => unknown_field(cmd, diag),
            }
        }
        Some(SceneObject::Sampler(samp))
    }
}

/// One shader stage. Holds the GPU-bound source (watch markers resolved)
/// and, in a debugging build, the transpiled host source handed to the
/// dynamic-compilation service.
#[derive(Debug)]
pub struct Shader {
    pub stage: StageKind,
    pub gpu_source: String,
    pub debug_source: Option<TranspiledSource>,
}

impl Shader {
    pub fn create(
        block: &Block,
        _scene: &Scene,
        builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let anno = block.annotation_token.as_deref().unwrap_or("");
        let Some(stage) = StageKind::from_annotation(anno) else {
            diag.add(
                ErrorKind::Reference,
                format!("Shader type '{anno}' is not supported."),
            );
            return None;
        };

        let (gpu_source, debug_source) = match builder.debug.as_deref_mut() {
            Some(session) => {
                let gpu = process_watches(&block.body, true, session.watch_count());
                (gpu, Some(transpile(stage, &block.body, true)))
            }
            None => {
                let mut unused = 0;
                (process_watches(&block.body, false, &mut unused), None)
            }
        };

        Some(SceneObject::Shader(Shader {
            stage,
            gpu_source,
            debug_source,
        }))
    }
}

/// Transform-feedback output: buffer bindings plus pause/resume behavior.
#[derive(Debug, Default)]
pub struct Vertoutput {
    pub pause: bool,
    pub resume: bool,
    pub bindings: Vec<String>,
}

impl Vertoutput {
    pub fn create(
        block: &Block,
        scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut out = Vertoutput::default();
        for cmd in &block.commands {
            match cmd.name.to_lowercase().as_str() {
                "pause" => set_scalar(&mut out.pause, cmd, diag),
                "resume" => set_scalar(&mut out.resume, cmd, diag),
                "buff" => {
                    let mut child = diag.with(format!("command '{}'", cmd.name));
                    if let Some(name) = cmd.args.first() {
                        if scene
                            .resolve(name, "buffer", as_buffer, &mut child)
                            .is_some()
                        {
                            out.bindings.push(name.clone());
                        }
                    } else {
                        no_arguments(cmd, &mut child);
                    }
                    diag.merge(child);
                }
                _ => unknown_field(cmd, diag),
            }
        }
        Some(SceneObject::Vertoutput(out))
    }
}

/// Framebuffer output: image attachments by attachment-point name.
#[derive(Debug, Default)]
pub struct Fragoutput {
    pub width: i64,
    pub height: i64,
    pub attachments: Vec<(String, String)>,
}

impl Fragoutput {
    pub fn create(
        block: &Block,
        scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut out = Fragoutput::default();
        for cmd in &block.commands {
            match cmd.name.to_lowercase().as_str() {
                "width" => set_scalar(&mut out.width, cmd, diag),
                "height" => set_scalar(&mut out.height, cmd, diag),
                point @ ("color" | "depth" | "stencil" | "depthstencil") => {
                    let mut child = diag.with(format!("command '{}'", cmd.name));
                    if let Some(name) = cmd.args.first() {
                        if scene.resolve(name, "image", as_image, &mut child).is_some() {
                            out.attachments.push((point.to_string(), name.clone()));
                        }
                    } else {
                        no_arguments(cmd, &mut child);
                    }
                    diag.merge(child);
                }
                _ => unknown_field(cmd, diag),
            }
        }
        Some(SceneObject::Fragoutput(out))
    }
}

/// One render or compute pass: its shader stages, optional outputs, and
/// raw draw/compute calls interpreted by the render loop.
#[derive(Debug, Default)]
pub struct Pass {
    pub shaders: Vec<(StageKind, String)>,
    pub fragout: Option<String>,
    pub vertout: Option<String>,
    pub calls: Vec<Command>,
}

impl Pass {
    pub fn create(
        block: &Block,
        scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut pass = Pass::default();
        for cmd in &block.commands {
            let mut child = diag.with(format!("command '{}'", cmd.name));
            match cmd.name.to_lowercase().as_str() {
                anno @ ("vert" | "tess" | "eval" | "geom" | "frag" | "comp") => {
                    let stage = StageKind::from_annotation(anno).expect("annotation is known");
                    if let Some(name) = cmd.args.first() {
                        if scene
                            .resolve(name, "shader", as_shader, &mut child)
                            .is_some()
                        {
                            pass.shaders.push((stage, name.clone()));
                        }
                    } else {
                        no_arguments(cmd, &mut child);
                    }
                }
                "fragout" => {
                    if let Some(name) = cmd.args.first() {
                        if scene
                            .resolve(name, "fragoutput", as_fragoutput, &mut child)
                            .is_some()
                        {
                            pass.fragout = Some(name.clone());
                        }
                    } else {
                        no_arguments(cmd, &mut child);
                    }
                }
                "vertout" => {
                    if let Some(name) = cmd.args.first() {
                        if scene
                            .resolve(name, "vertoutput", as_vertoutput, &mut child)
                            .is_some()
                        {
                            pass.vertout = Some(name.clone());
                        }
                    } else {
                        no_arguments(cmd, &mut child);
                    }
                }
                "draw" | "compute" => pass.calls.push(cmd.clone()),
                _ => unknown_field(cmd, &mut child),
            }
            diag.merge(child);
        }
        Some(SceneObject::Pass(pass))
    }
}

/// Ordered list of passes executed per frame.
#[derive(Debug, Default)]
pub struct Tech {
    pub passes: Vec<String>,
}

impl Tech {
    pub fn create(
        block: &Block,
        scene: &Scene,
        _builder: &mut Builder,
        diag: &mut Diagnostics,
    ) -> Option<SceneObject> {
        let mut tech = Tech::default();
        for cmd in &block.commands {
            match cmd.name.to_lowercase().as_str() {
                "pass" => {
                    let mut child = diag.with(format!("command '{}'", cmd.name));
                    if let Some(name) = cmd.args.first() {
                        if scene.resolve(name, "pass", as_pass, &mut child).is_some() {
                            tech.passes.push(name.clone());
                        }
                    } else {
                        no_arguments(cmd, &mut child);
                    }
                    diag.merge(child);
                }
                _ => unknown_field(cmd, diag),
            }
        }
        Some(SceneObject::Tech(tech))
    }
}

fn as_buffer(obj: &SceneObject) -> Option<&Buffer> {
    match obj {
        SceneObject::Buffer(b) => Some(b),
        _ => None,
    }
}

fn as_image(obj: &SceneObject) -> Option<&Image> {
    match obj {
        SceneObject::Image(i) => Some(i),
        _ => None,
    }
}

fn as_shader(obj: &SceneObject) -> Option<&Shader> {
    match obj {
        SceneObject::Shader(s) => Some(s),
        _ => None,
    }
}

fn as_fragoutput(obj: &SceneObject) -> Option<&Fragoutput> {
    match obj {
        SceneObject::Fragoutput(f) => Some(f),
        _ => None,
    }
}

fn as_vertoutput(obj: &SceneObject) -> Option<&Vertoutput> {
    match obj {
        SceneObject::Vertoutput(v) => Some(v),
        _ => None,
    }
}

fn as_pass(obj: &SceneObject) -> Option<&Pass> {
    match obj {
        SceneObject::Pass(p) => Some(p),
        _ => None,
    }
}
