mod objects;

use tracing::{debug, warn};

pub use objects::{Buffer, Fragoutput, Image, Pass, Sampler, Shader, Tech, Vertoutput};

use crate::compiler::Block;
use crate::diag::{Diagnostics, ErrorKind};
use crate::trace::DebugSession;

/// One constructed pipeline object.
#[derive(Debug)]
pub enum SceneObject {
    Buffer(Buffer),
    Image(Image),
    Sampler(Sampler),
    Shader(Shader),
    Vertoutput(Vertoutput),
    Fragoutput(Fragoutput),
    Pass(Pass),
    Tech(Tech),
}

impl SceneObject {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Image(_) => "image",
            Self::Sampler(_) => "sampler",
            Self::Shader(_) => "shader",
            Self::Vertoutput(_) => "vertoutput",
            Self::Fragoutput(_) => "fragoutput",
            Self::Pass(_) => "pass",
            Self::Tech(_) => "tech",
        }
    }
}

/// Shared state of one scene build: the debug session, when compiling for
/// shader debugging.
pub struct Builder<'a> {
    pub debug: Option<&'a mut DebugSession>,
}

type Factory = fn(&Block, &Scene, &mut Builder, &mut Diagnostics) -> Option<SceneObject>;

/// Explicit mapping from block type token to constructor; unknown tokens
/// are a Reference error for that block only.
fn lookup(type_token: &str) -> Option<Factory> {
    const REGISTRY: &[(&str, Factory)] = &[
        ("buffer", Buffer::create),
        ("image", Image::create),
        ("sampler", Sampler::create),
        ("shader", Shader::create),
        ("vertoutput", Vertoutput::create),
        ("fragoutput", Fragoutput::create),
        ("pass", Pass::create),
        ("tech", Tech::create),
    ];
    REGISTRY
        .iter()
        .find(|(token, _)| *token == type_token)
        .map(|(_, factory)| *factory)
}

/// Ordered name -> object map for one compilation unit. Later blocks may
/// reference names defined by earlier ones, so insertion order is kept.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<(String, SceneObject)>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, obj)| obj)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.objects.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn insert(&mut self, name: String, obj: SceneObject) {
        self.objects.push((name, obj));
    }

    /// Look up a name expecting a specific kind; a miss or kind mismatch
    /// is reported as a Reference error.
    pub fn resolve<'a, T>(
        &'a self,
        name: &str,
        kind: &str,
        extract: impl Fn(&'a SceneObject) -> Option<&'a T>,
        diag: &mut Diagnostics,
    ) -> Option<&'a T> {
        match self.get(name).and_then(extract) {
            Some(obj) => Some(obj),
            None => {
                diag.add(
                    ErrorKind::Reference,
                    format!(
                        "The name '{name}' could not be found or \
                         does not reference an object of type '{kind}'."
                    ),
                );
                None
            }
        }
    }
}

/// Instantiate every block of a unit, in order, isolating failures per
/// object: a failed object is absent from the scene and its messages land
/// in `log`, but the remaining blocks are still processed.
pub fn build_scene(blocks: &[Block], builder: &mut Builder, log: &mut Diagnostics) -> Scene {
    let mut scene = Scene::new();

    for block in blocks {
        let mut diag =
            Diagnostics::with_context(format!("{} '{}'", block.type_token, block.name_token));

        let Some(factory) = lookup(&block.type_token) else {
            diag.add(
                ErrorKind::Reference,
                format!("Object type '{}' is not known.", block.type_token),
            );
            log.merge(diag);
            continue;
        };

        if scene.contains(&block.name_token) {
            diag.add(
                ErrorKind::Reference,
                format!("Object name '{}' already exists.", block.name_token),
            );
            log.merge(diag);
            continue;
        }

        let obj = factory(block, &scene, builder, &mut diag);
        if diag.has_errors() {
            warn!(
                kind = %block.type_token,
                name = %block.name_token,
                "object construction failed"
            );
            log.merge(diag);
            continue;
        }
        if let Some(obj) = obj {
            debug!(kind = obj.kind(), name = %block.name_token, "object constructed");
            scene.insert(block.name_token.clone(), obj);
        }
    }

    scene
}
