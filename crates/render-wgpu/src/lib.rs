//! wgpu render backend for the globe.
//!
//! Uploads a [`Scene`](globeview_scene::Scene) once and then draws it every
//! frame: stars, the textured and lit surface, the wireframe, both rim
//! shells with additive blending, and instanced markers.
//!
//! # Invariants
//! - Buffers and textures are created at upload time only; frames write
//!   uniforms and instance data, nothing else.
//! - The rim shaders evaluate the same law as
//!   [`SurfaceShader::intensity`](globeview_scene::SurfaceShader::intensity).

mod gpu;
mod shaders;
mod surface;

pub use gpu::GlobeRenderer;
pub use surface::WgpuSurface;
