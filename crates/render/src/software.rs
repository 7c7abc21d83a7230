//! CPU reference renderer.
//!
//! Ray-casts the shells one pixel at a time, evaluates the rim shading
//! functions directly through [`SurfaceShader`], and splats stars and
//! markers on top. Slow, but needs no GPU and is bit-for-bit deterministic.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Quat, Vec2, Vec3};
use globeview_assets::Raster;
use globeview_common::geo::{to_uv, unproject};
use globeview_common::{Color, LightingConfig, Transform};
use globeview_scene::{Blend, Face, Mesh, Scene, ShellMaterial, SurfaceShader, VIEW_AXIS};

use crate::camera::PerspectiveCamera;
use crate::renderer::{FrameView, Renderer};
use crate::surface::RenderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftwareRenderer {
    pub background: Color,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self {
            background: Color::hex(0x000000),
        }
    }
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for SoftwareRenderer {
    type Output = Result<Raster, RenderError>;

    fn render(&self, frame: &FrameView<'_>) -> Result<Raster, RenderError> {
        let scene = frame.scene;
        let cam = frame.camera;
        let extent = cam.extent();
        let _span = tracing::trace_span!(
            "software_render",
            width = extent.width,
            height = extent.height,
            markers = scene.markers.len()
        )
        .entered();
        let texture = frame
            .assets
            .texture(scene.texture)
            .ok_or(RenderError::MissingAsset(scene.texture))?;
        let mut out = Raster::filled(extent.width, extent.height, self.background)?;

        let globe = frame.state.globe_orientation().to_quat();
        let layers = Layers::collect(scene);

        draw_stars(&mut out, scene, frame.state.star_yaw, cam);

        let inverse = globe.inverse();
        let focal = cam.focal_px();
        for y in 0..extent.height {
            for x in 0..extent.width {
                let (o, d) = cam.ray(x, y);
                layers.shade(&mut out, x, y, o, d, inverse, &texture, focal);
            }
        }

        draw_markers(&mut out, frame, globe);
        Ok(out)
    }
}

struct Wire {
    radius: f32,
    color: Color,
    opacity: f32,
    segments: u32,
}

/// The shells of a scene, unpacked for per-pixel evaluation.
struct Layers<'a> {
    surface: Option<(f32, &'a LightingConfig)>,
    wire: Option<Wire>,
    rims: Vec<(f32, &'a dyn SurfaceShader)>,
}

impl<'a> Layers<'a> {
    fn collect(scene: &'a Scene) -> Self {
        let mut layers = Layers {
            surface: None,
            wire: None,
            rims: Vec::new(),
        };
        for shell in &scene.shells {
            match (&shell.material, shell.kind) {
                (ShellMaterial::Textured { lighting, .. }, _) => {
                    layers.surface = Some((shell.radius, lighting));
                }
                (
                    ShellMaterial::Wire {
                        color,
                        opacity,
                        segments,
                    },
                    _,
                ) => {
                    layers.wire = Some(Wire {
                        radius: shell.radius,
                        color: *color,
                        opacity: *opacity,
                        segments: *segments,
                    });
                }
                (ShellMaterial::Rim(shader), kind) => {
                    debug_assert!(!kind.rotates_with_globe());
                    layers.rims.push((shell.radius, shader.as_ref()));
                }
            }
        }
        layers
    }

    #[allow(clippy::too_many_arguments)]
    fn shade(
        &self,
        out: &mut Raster,
        x: u32,
        y: u32,
        o: Vec3,
        d: Vec3,
        inverse: Quat,
        texture: &Raster,
        focal: f32,
    ) {
        let surface_t = self
            .surface
            .and_then(|(r, _)| intersect(o, d, r))
            .map(|(t0, _)| t0);

        if let (Some(t), Some((_, lighting))) = (surface_t, self.surface) {
            let p = o + d * t;
            let n = p.normalize();
            let local = inverse * n;
            let (u, v) = to_uv(unproject(local.as_dvec3()));
            let base = texture.sample_color(u, v);
            out.put(x, y, lit(base, n, p, lighting).to_rgba8(1.0));
        }

        if let Some(w) = &self.wire {
            if let Some((t, _)) = intersect(o, d, w.radius) {
                let local = inverse * (o + d * t).normalize();
                let tolerance = 0.6 * t / focal / w.radius;
                if on_grid(local, w.segments, tolerance) {
                    out.blend(x, y, w.color, w.opacity);
                }
            }
        }

        for (radius, shader) in &self.rims {
            let Some((t0, t1)) = intersect(o, d, *radius) else {
                continue;
            };
            let t = match shader.face() {
                Face::Front => t0,
                Face::Back => t1,
            };
            if surface_t.is_some_and(|s| s < t) {
                continue;
            }
            let n = (o + d * t) / *radius;
            let alpha = shader.alpha(n, VIEW_AXIS);
            if alpha <= 0.0 {
                continue;
            }
            match shader.blend() {
                Blend::Additive => out.add(x, y, shader.color(), alpha),
                Blend::Alpha => out.blend(x, y, shader.color(), alpha),
            }
        }
    }
}

/// Ray/sphere intersection for a sphere at the origin. Both roots, nearest first,
/// only when the nearer one lies ahead of the ray origin.
fn intersect(o: Vec3, d: Vec3, radius: f32) -> Option<(f32, f32)> {
    let b = o.dot(d);
    let c = o.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let s = disc.sqrt();
    let (t0, t1) = (-b - s, -b + s);
    (t0 > 0.0).then_some((t0, t1))
}

fn lit(base: Color, n: Vec3, p: Vec3, lighting: &LightingConfig) -> Color {
    let mut acc = Vec3::from(lighting.ambient.scaled(lighting.ambient_intensity).to_array());
    for light in &lighting.lights {
        let dir = (Vec3::from(light.position) - p).normalize_or_zero();
        let k = n.dot(dir).max(0.0) * light.intensity;
        acc += Vec3::from(light.color.to_array()) * k;
    }
    Color::rgb(base.r * acc.x, base.g * acc.y, base.b * acc.z)
}

/// Whether a unit point lies within `tolerance` radians of a grid line.
fn on_grid(local: Vec3, segments: u32, tolerance: f32) -> bool {
    let segs = segments.max(1) as f32;
    let lat = local.y.clamp(-1.0, 1.0).asin();
    let lon = (-local.z).atan2(local.x);
    let near = |angle: f32, step: f32| {
        let k = angle / step;
        (k - k.round()).abs() * step
    };
    near(lat + FRAC_PI_2, PI / segs) < tolerance
        || near(lon + PI, TAU / segs) * lat.cos() < tolerance
}

fn draw_stars(out: &mut Raster, scene: &Scene, yaw: f64, cam: &PerspectiveCamera) {
    let stars = &scene.stars;
    let rotation = Quat::from_rotation_y(yaw as f32);
    let focal = cam.focal_px();
    for p in &stars.positions {
        let Some((px, depth)) = cam.project(rotation * *p) else {
            continue;
        };
        let size = (stars.size * focal / depth).max(1.0);
        let half = size * 0.5;
        let (x0, y0) = ((px.x - half).round(), (px.y - half).round());
        let n = size.round().max(1.0) as i32;
        for dy in 0..n {
            for dx in 0..n {
                let (x, y) = (x0 as i32 + dx, y0 as i32 + dy);
                if x >= 0 && y >= 0 {
                    out.blend(x as u32, y as u32, Color::WHITE, stars.opacity);
                }
            }
        }
    }
}

fn draw_markers(out: &mut Raster, frame: &FrameView<'_>, globe: Quat) {
    let overlay = &frame.scene.markers;
    let cfg = &overlay.config;
    let cam = frame.camera;
    let eye = cam.eye();
    let group = Mat4::from_quat(globe);

    for m in &overlay.markers {
        let surface = globe * m.surface;
        // Beyond the horizon seen from the eye.
        if surface.dot(eye - surface) <= 0.0 {
            continue;
        }
        disk(out, cam, globe * m.halo.position, m.halo.scale.x, m.color, cfg.halo_opacity);
        disk(out, cam, globe * m.dot.position, m.dot.scale.x, m.color, 1.0);

        let p = frame.state.pulse(m.phase, &cfg.pulse);
        let ring = Transform {
            scale: Vec3::splat(p.scale as f32),
            ..m.ring
        };
        let opacity = p.opacity.clamp(0.0, 1.0) as f32;
        fill_mesh(out, cam, group * ring.matrix(), &overlay.ring, m.color, opacity);

        if let Some(beam) = &m.beam {
            fill_mesh(out, cam, group * beam.matrix(), &overlay.beam, m.color, cfg.beam_opacity);
        }
    }
}

fn disk(out: &mut Raster, cam: &PerspectiveCamera, center: Vec3, radius: f32, color: Color, alpha: f32) {
    let Some((c, depth)) = cam.project(center) else {
        return;
    };
    let r = radius * cam.focal_px() / depth;
    let (x0, x1) = ((c.x - r).floor().max(0.0) as u32, (c.x + r).ceil().max(0.0) as u32);
    let (y0, y1) = ((c.y - r).floor().max(0.0) as u32, (c.y + r).ceil().max(0.0) as u32);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let q = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            if q.distance_squared(c) <= r * r {
                if alpha >= 1.0 {
                    out.put(x, y, color.to_rgba8(1.0));
                } else {
                    out.blend(x, y, color, alpha);
                }
            }
        }
    }
}

fn fill_mesh(out: &mut Raster, cam: &PerspectiveCamera, model: Mat4, mesh: &Mesh, color: Color, alpha: f32) {
    let projected: Vec<Option<Vec2>> = mesh
        .positions
        .iter()
        .map(|p| cam.project(model.transform_point3(Vec3::from(*p))).map(|(px, _)| px))
        .collect();
    for tri in mesh.indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            projected[tri[0] as usize],
            projected[tri[1] as usize],
            projected[tri[2] as usize],
        ) else {
            continue;
        };
        fill_triangle(out, a, b, c, color, alpha);
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

/// Fill pixels whose centers fall inside the triangle, either winding.
fn fill_triangle(out: &mut Raster, a: Vec2, b: Vec2, c: Vec2, color: Color, alpha: f32) {
    let area = edge(a, b, c);
    if area.abs() < f32::EPSILON {
        return;
    }
    let min = a.min(b).min(c).floor().max(Vec2::ZERO);
    let max = a.max(b).max(c).ceil();
    let w = out.width() as f32;
    let h = out.height() as f32;
    let (x0, x1) = (min.x as u32, max.x.min(w) as u32);
    let (y0, y1) = (min.y as u32, max.y.min(h) as u32);
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let (e0, e1, e2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
            let inside = if area > 0.0 {
                e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0
            } else {
                e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0
            };
            if inside {
                out.blend(x, y, color, alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_assets::AssetStore;
    use globeview_common::{EngineConfig, Extent, GeoEntity, QualityPreset, Tier};
    use globeview_kernel::AnimationState;
    use globeview_scene::build_scene;

    fn config() -> EngineConfig {
        let mut cfg = EngineConfig::preset(QualityPreset::Lite);
        cfg.stars.count = 0;
        cfg
    }

    fn render(entities: &[GeoEntity], state: &AnimationState) -> Raster {
        let cfg = config();
        let mut assets = AssetStore::new();
        let scene = build_scene(entities, &cfg, &mut assets).unwrap();
        let camera = PerspectiveCamera::new(&cfg.camera, Extent::new(96, 72));
        let frame = FrameView {
            scene: &scene,
            assets: &assets,
            state,
            camera: &camera,
        };
        SoftwareRenderer::new().render(&frame).unwrap()
    }

    #[test]
    fn facing_marker_covers_center() {
        // Longitude -90 on the equator faces the camera at zero rotation.
        let e = GeoEntity::new("FACE", -90.0, 0.0, 55.0);
        let img = render(&[e], &AnimationState::new());
        assert_eq!(img.get(48, 36), Some(Tier::Mid.color().to_rgba8(1.0)));
    }

    #[test]
    fn hidden_marker_is_not_drawn() {
        let e = GeoEntity::new("BACK", 90.0, 0.0, 55.0);
        let img = render(&[e], &AnimationState::new());
        assert_ne!(img.get(48, 36), Some(Tier::Mid.color().to_rgba8(1.0)));
    }

    #[test]
    fn glow_lights_the_limb_but_not_the_corner() {
        let img = render(&[], &AnimationState::new());
        assert_eq!(img.get(0, 0), Some([0, 0, 0, 255]));
        let limb = img.get(84, 36).unwrap();
        assert!(limb[1] > 0 && limb[2] > 0, "{limb:?}");
        assert_eq!(limb[0], 0);
    }

    #[test]
    fn rotation_changes_the_frame() {
        let still = render(&[], &AnimationState::new());
        let mut turned = AnimationState::new();
        turned.spin = 1.0;
        assert_ne!(still, render(&[], &turned));
    }

    #[test]
    fn missing_texture_is_an_error() {
        let cfg = config();
        let mut assets = AssetStore::new();
        let scene = build_scene(&[], &cfg, &mut assets).unwrap();
        let empty = AssetStore::new();
        let camera = PerspectiveCamera::new(&cfg.camera, Extent::new(8, 8));
        let state = AnimationState::new();
        let frame = FrameView {
            scene: &scene,
            assets: &empty,
            state: &state,
            camera: &camera,
        };
        assert!(matches!(
            SoftwareRenderer::new().render(&frame),
            Err(RenderError::MissingAsset(_))
        ));
    }

    #[test]
    fn grid_detection() {
        // Equator of an even subdivision is always a latitude line.
        assert!(on_grid(Vec3::X, 24, 1e-3));
        let off = Vec3::new(1.0, 0.05, 0.05).normalize();
        assert!(!on_grid(off, 24, 1e-3));
    }
}
