use std::sync::Arc;

use globeview_assets::AssetId;
use globeview_common::{Color, EngineConfig, LightingConfig};

use crate::mesh::{self, LineMesh, Mesh};
use crate::shading::{Atmosphere, RimGlow, SurfaceShader};

/// The concentric layers of the globe, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShellKind {
    Surface,
    Wireframe,
    Atmosphere,
    Glow,
}

impl ShellKind {
    pub fn name(self) -> &'static str {
        match self {
            ShellKind::Surface => "surface",
            ShellKind::Wireframe => "wireframe",
            ShellKind::Atmosphere => "atmosphere",
            ShellKind::Glow => "glow",
        }
    }

    /// Surface and wireframe turn with the globe; the rim shells are view-aligned.
    pub fn rotates_with_globe(self) -> bool {
        matches!(self, ShellKind::Surface | ShellKind::Wireframe)
    }
}

#[derive(Debug, Clone)]
pub enum ShellMaterial {
    /// Lit, textured opaque surface.
    Textured {
        texture: AssetId,
        lighting: LightingConfig,
    },
    /// Unlit translucent latitude/longitude lines.
    Wire {
        color: Color,
        opacity: f32,
        segments: u32,
    },
    /// Rim-lit translucent surface.
    Rim(Arc<dyn SurfaceShader>),
}

#[derive(Debug, Clone)]
pub enum ShellGeometry {
    Triangles(Mesh),
    Lines(LineMesh),
}

#[derive(Debug, Clone)]
pub struct Shell {
    pub kind: ShellKind,
    pub radius: f32,
    pub geometry: ShellGeometry,
    pub material: ShellMaterial,
}

impl Shell {
    /// Shader backing a rim shell.
    pub fn shader(&self) -> Option<&dyn SurfaceShader> {
        match &self.material {
            ShellMaterial::Rim(s) => Some(s.as_ref()),
            _ => None,
        }
    }
}

/// Build the four shells in draw order: surface, wireframe, atmosphere, glow.
pub fn build_shells(config: &EngineConfig, texture: AssetId) -> Vec<Shell> {
    let g = &config.globe;
    let w = &config.wireframe;
    vec![
        Shell {
            kind: ShellKind::Surface,
            radius: g.radius,
            geometry: ShellGeometry::Triangles(mesh::uv_sphere(
                g.radius,
                g.width_segments,
                g.height_segments,
            )),
            material: ShellMaterial::Textured {
                texture,
                lighting: g.lighting.clone(),
            },
        },
        Shell {
            kind: ShellKind::Wireframe,
            radius: w.radius,
            geometry: ShellGeometry::Lines(mesh::wire_sphere(w.radius, w.segments)),
            material: ShellMaterial::Wire {
                color: w.color,
                opacity: w.opacity,
                segments: w.segments,
            },
        },
        rim_shell(ShellKind::Atmosphere, Arc::new(Atmosphere::new(config.atmosphere))),
        rim_shell(ShellKind::Glow, Arc::new(RimGlow::new(config.glow))),
    ]
}

fn rim_shell(kind: ShellKind, shader: Arc<dyn SurfaceShader>) -> Shell {
    let p = *shader.params();
    Shell {
        kind,
        radius: p.radius,
        geometry: ShellGeometry::Triangles(mesh::uv_sphere(p.radius, p.segments, p.segments / 2)),
        material: ShellMaterial::Rim(shader),
    }
}
