use anyhow::{Context, Result};
use clap::Parser;
use globeview_assets::AssetStore;
use globeview_common::{EngineConfig, Extent, FrameRequest, GeoEntity, ListenerId, QualityPreset};
use globeview_engine::{GlobeEngine, Host, HostEvent, ListenerKind};
use globeview_render::RenderError;
use globeview_render_wgpu::WgpuSurface;
use globeview_scene::Scene;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "globeview-desktop", about = "Interactive globe with plotted entities")]
struct Cli {
    /// Quality preset: detailed or lite
    #[arg(long)]
    preset: QualityPreset,

    /// YAML file replacing the preset's parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of entities: [{"id", "longitude", "latitude", "metric"}]
    #[arg(long, default_value = "data/entities.json")]
    entities: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// A winit window as the engine's container.
///
/// Frame requests map onto `request_redraw`; the pending token is handed back
/// to the engine on the next `RedrawRequested`.
struct WindowHost {
    window: Arc<Window>,
    listeners: HashMap<ListenerId, ListenerKind>,
    next_frame: u64,
    pending: Option<FrameRequest>,
}

impl WindowHost {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            listeners: HashMap::new(),
            next_frame: 0,
            pending: None,
        }
    }

    fn listening(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|k| *k == kind)
    }
}

impl Host for WindowHost {
    type Surface = WgpuSurface;

    fn container_extent(&self) -> Option<Extent> {
        let size = self.window.inner_size();
        Some(Extent::new(size.width, size.height))
    }

    fn create_surface(
        &mut self,
        extent: Extent,
        scene: &Scene,
        assets: &AssetStore,
    ) -> Result<WgpuSurface, RenderError> {
        WgpuSurface::new(self.window.clone(), extent, scene, assets)
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.next_frame += 1;
        let frame = FrameRequest(self.next_frame);
        self.pending = Some(frame);
        self.window.request_redraw();
        frame
    }

    fn cancel_frame(&mut self, frame: FrameRequest) {
        if self.pending == Some(frame) {
            self.pending = None;
        }
    }
}

struct GlobeApp {
    config: EngineConfig,
    entities: Vec<GeoEntity>,
    engine: Option<GlobeEngine<WindowHost>>,
    failure: Option<anyhow::Error>,
}

impl GlobeApp {
    fn new(config: EngineConfig, entities: Vec<GeoEntity>) -> Self {
        Self {
            config,
            entities,
            engine: None,
            failure: None,
        }
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Globeview")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let engine = GlobeEngine::initialize(WindowHost::new(window), &self.entities, &self.config)
            .context("initialize globe engine")?;
        self.engine = Some(engine);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut engine) = self.engine.take() {
            engine.dispose();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for GlobeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(e) = self.mount(event_loop) {
            tracing::error!("{e:#}");
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(engine) = &mut self.engine else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(_) => {
                if engine.host().listening(ListenerKind::Resize) {
                    engine.handle_event(HostEvent::Resized);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if engine.host().listening(ListenerKind::PointerMove) {
                    engine.handle_event(HostEvent::PointerMoved {
                        x: position.x,
                        y: position.y,
                    });
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(frame) = engine.host_mut().pending.take() else {
                    return;
                };
                match engine.on_frame(frame) {
                    Ok(_) => {}
                    Err(e @ (RenderError::Detached | RenderError::SurfaceUnavailable(_))) => {
                        tracing::error!("render surface lost: {e}");
                        self.shutdown(event_loop);
                    }
                    Err(e) => tracing::error!("frame failed: {e}"),
                }
            }
            _ => {}
        }
    }
}

fn load_config(preset: QualityPreset, path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::preset(preset));
    };
    let config = EngineConfig::load(path)
        .with_context(|| format!("load config {}", path.display()))?;
    if config.preset != preset {
        tracing::warn!(
            requested = %preset,
            file = %config.preset,
            "config file preset differs from --preset; using the file"
        );
    }
    Ok(config)
}

fn load_entities(path: &Path) -> Result<Vec<GeoEntity>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let entities: Vec<GeoEntity> =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(entities)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.preset, cli.config.as_deref())?;
    let entities = load_entities(&cli.entities)?;
    tracing::info!(preset = %config.preset, entities = entities.len(), "globeview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GlobeApp::new(config, entities);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
