use globeview_assets::AssetStore;
use globeview_common::Extent;
use globeview_render::{FrameStatus, FrameView, RenderError, RenderSurface};
use globeview_scene::Scene;

use crate::gpu::GlobeRenderer;

/// Window-backed wgpu surface implementing [`RenderSurface`].
///
/// `detach` drops the `wgpu::Surface` (releasing the window), and
/// `release_resources` destroys every buffer and texture the scene uploaded.
pub struct WgpuSurface {
    surface: Option<wgpu::Surface<'static>>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: Option<GlobeRenderer>,
}

impl WgpuSurface {
    /// Acquire an adapter and device for `target`, then upload `scene`.
    ///
    /// Fails with [`RenderError::SurfaceUnavailable`] when no compatible
    /// adapter or device exists.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        extent: Extent,
        scene: &Scene,
        assets: &AssetStore,
    ) -> Result<Self, RenderError> {
        let extent = extent.clamped();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::SurfaceUnavailable(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::SurfaceUnavailable("no compatible adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("globeview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::SurfaceUnavailable(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::SurfaceUnavailable("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: extent.width,
            height: extent.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = GlobeRenderer::new(&device, &queue, format, extent, scene, assets)?;

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            width = extent.width,
            height = extent.height,
            "GPU surface initialized"
        );

        Ok(Self {
            surface: Some(surface),
            device,
            queue,
            config,
            renderer: Some(renderer),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }
}

impl RenderSurface for WgpuSurface {
    fn resize(&mut self, extent: Extent) {
        let extent = extent.clamped();
        self.config.width = extent.width;
        self.config.height = extent.height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(&self.device, extent);
        }
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<FrameStatus, RenderError> {
        let (Some(surface), Some(renderer)) = (&self.surface, &mut self.renderer) else {
            return Err(RenderError::Detached);
        };
        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfigured and skipped frame");
                surface.configure(&self.device, &self.config);
                return Ok(FrameStatus::Skipped);
            }
            Err(e) => return Err(RenderError::Backend(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        renderer.render(&self.device, &self.queue, &view, frame);
        output.present();
        Ok(FrameStatus::Presented)
    }

    fn detach(&mut self) {
        if self.surface.take().is_some() {
            tracing::debug!("GPU surface detached");
        }
    }

    fn release_resources(&mut self) -> usize {
        let released = self.renderer.take().map_or(0, GlobeRenderer::destroy);
        if released > 0 {
            tracing::debug!(released, "GPU resources released");
        }
        released
    }
}
