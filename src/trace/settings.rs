use serde::{Deserialize, Serialize};

use crate::glsl::StageKind;

/// Identity of one GPU invocation, per stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Vertex { instance_id: i32, vertex_id: i32 },
    TessControl { invocation_id: i32, primitive_id: i32 },
    TessEval { primitive_id: i32 },
    Geometry { primitive_id_in: i32, invocation_id: i32 },
    Fragment { frag_coord: [i32; 2], layer: i32, viewport_index: i32 },
    Compute { global_invocation_id: [u32; 3] },
}

/// Selects the single invocation the user wants to inspect, one selector
/// set per stage. Serialized for the external settings surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub vs_instance_id: i32,
    pub vs_vertex_id: i32,
    pub ts_invocation_id: i32,
    pub ts_primitive_id: i32,
    pub gs_invocation_id: i32,
    pub gs_primitive_id_in: i32,
    pub fs_frag_coord: [i32; 2],
    pub fs_layer: i32,
    pub fs_viewport_index: i32,
    pub cs_global_invocation_id: [u32; 3],
}

impl DebugSettings {
    /// Whether the given invocation is the one selected for its stage.
    pub fn matches(&self, stage: StageKind, invocation: &Invocation) -> bool {
        match (stage, invocation) {
            (
                StageKind::Vertex,
                Invocation::Vertex {
                    instance_id,
                    vertex_id,
                },
            ) => *instance_id == self.vs_instance_id && *vertex_id == self.vs_vertex_id,
            (
                StageKind::TessControl,
                Invocation::TessControl {
                    invocation_id,
                    primitive_id,
                },
            ) => *invocation_id == self.ts_invocation_id && *primitive_id == self.ts_primitive_id,
            (StageKind::TessEval, Invocation::TessEval { primitive_id }) => {
                *primitive_id == self.ts_primitive_id
            }
            (
                StageKind::Geometry,
                Invocation::Geometry {
                    primitive_id_in,
                    invocation_id,
                },
            ) => {
                *primitive_id_in == self.gs_primitive_id_in
                    && *invocation_id == self.gs_invocation_id
            }
            (
                StageKind::Fragment,
                Invocation::Fragment {
                    frag_coord,
                    layer,
                    viewport_index,
                },
            ) => {
                *frag_coord == self.fs_frag_coord
                    && *layer == self.fs_layer
                    && *viewport_index == self.fs_viewport_index
            }
            (
                StageKind::Compute,
                Invocation::Compute {
                    global_invocation_id,
                },
            ) => *global_invocation_id == self.cs_global_invocation_id,
            _ => false,
        }
    }
}
