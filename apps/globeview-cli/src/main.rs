use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use globeview_assets::{AssetStore, generate_surface_texture};
use globeview_common::geo::to_uv;
use globeview_common::{EngineConfig, Extent, FrameRequest, GeoCoord, GeoEntity, QualityPreset, Tier, project};
use globeview_input::InteractionController;
use globeview_kernel::{AnimationScheduler, AnimationState};
use globeview_render::{DebugTextRenderer, FrameView, PerspectiveCamera, Renderer, SoftwareRenderer};
use globeview_scene::build_scene;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "globeview-cli", about = "Headless tooling for the globe engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Quality preset: detailed or lite
    #[arg(long)]
    preset: QualityPreset,

    /// YAML file replacing the preset's parameters
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct PointerArgs {
    /// Simulated pointer position, in viewport pixels
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pointer: Option<Vec<f64>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, presets, and their key parameters
    Info,
    /// Project a longitude/latitude pair onto the unit sphere
    Project {
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },
    /// Classify a 0-100 metric into a tier
    Classify { metric: f64 },
    /// Write the procedural surface texture as PPM
    Texture {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(short, long, default_value = "surface.ppm")]
        output: PathBuf,
    },
    /// Advance N ticks, then render one frame offscreen to PPM
    Render {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, default_value = "data/entities.json")]
        entities: PathBuf,
        #[arg(long, default_value = "0")]
        ticks: u64,
        #[arg(long, default_value = "640")]
        width: u32,
        #[arg(long, default_value = "480")]
        height: u32,
        #[command(flatten)]
        pointer: PointerArgs,
        #[arg(short, long, default_value = "frame.ppm")]
        output: PathBuf,
    },
    /// Print rotation and pulse state for each tick
    Simulate {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, default_value = "data/entities.json")]
        entities: PathBuf,
        #[arg(long, default_value = "10")]
        ticks: u64,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        #[command(flatten)]
        pointer: PointerArgs,
    },
}

fn load_config(args: &ConfigArgs) -> Result<EngineConfig> {
    let Some(path) = &args.config else {
        return Ok(EngineConfig::preset(args.preset));
    };
    let config = EngineConfig::load(path)
        .with_context(|| format!("load config {}", path.display()))?;
    if config.preset != args.preset {
        tracing::warn!(
            requested = %args.preset,
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

/// Run `ticks` scheduler ticks with a fixed pointer-driven target.
fn advance(
    config: &EngineConfig,
    viewport: Extent,
    pointer: &PointerArgs,
    ticks: u64,
    mut each: impl FnMut(&AnimationState),
) -> Result<AnimationState> {
    let mut controller = InteractionController::new(&config.motion);
    if let Some([x, y]) = pointer.pointer.as_deref() {
        if !controller.pointer_moved(*x, *y, viewport) {
            tracing::warn!(x, y, "pointer outside the viewport; target stays at rest");
        }
    }

    let mut scheduler = AnimationScheduler::new(config.motion, config.stars.rotation_speed);
    scheduler.start(FrameRequest(1))?;
    for n in 1..=ticks {
        if let Some(state) = scheduler.on_frame(FrameRequest(n), controller.target()) {
            each(state);
        }
        scheduler.rearm(FrameRequest(n + 1))?;
    }
    let state = *scheduler.state();
    scheduler.cancel();
    Ok(state)
}

fn hex(color: globeview_common::Color) -> String {
    let [r, g, b, _] = color.to_rgba8(1.0);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("globeview-cli v{}", env!("CARGO_PKG_VERSION"));
            for preset in QualityPreset::ALL {
                let c = EngineConfig::preset(preset);
                println!(
                    "{preset}: texture={}x{} sphere={}x{} stars={} glow(c={}, p={}) damping={} auto-rotation={}",
                    c.texture.width,
                    c.texture.height,
                    c.globe.width_segments,
                    c.globe.height_segments,
                    c.stars.count,
                    c.glow.c,
                    c.glow.p,
                    c.motion.damping,
                    c.motion.auto_rotation,
                );
            }
            for tier in [Tier::High, Tier::Mid, Tier::Low] {
                println!("tier {tier}: {}", hex(tier.color()));
            }
        }
        Commands::Project { lon, lat } => {
            let p = project(lon, lat);
            let (u, v) = to_uv(GeoCoord::new(lon, lat));
            println!(
                "({lon}, {lat}) -> x={:.6} y={:.6} z={:.6} |p|={:.6} uv=({u:.6}, {v:.6})",
                p.x,
                p.y,
                p.z,
                p.length()
            );
        }
        Commands::Classify { metric } => {
            let tier = Tier::classify(metric);
            println!("{metric} -> {tier} ({})", hex(tier.color()));
        }
        Commands::Texture { config, output } => {
            let config = load_config(&config)?;
            let raster = generate_surface_texture(&config.texture)?;
            raster
                .save_ppm(&output)
                .with_context(|| format!("write {}", output.display()))?;
            println!(
                "wrote {}x{} texture to {}",
                raster.width(),
                raster.height(),
                output.display()
            );
        }
        Commands::Render {
            config,
            entities,
            ticks,
            width,
            height,
            pointer,
            output,
        } => {
            let config = load_config(&config)?;
            let entities = load_entities(&entities)?;
            let viewport = Extent::new(width, height);

            let mut assets = AssetStore::new();
            let scene = build_scene(&entities, &config, &mut assets)?;
            let camera = PerspectiveCamera::new(&config.camera, viewport);
            let state = advance(&config, viewport, &pointer, ticks, |_| {})?;

            let frame = FrameView {
                scene: &scene,
                assets: &assets,
                state: &state,
                camera: &camera,
            };
            let image = SoftwareRenderer::new().render(&frame)?;
            image
                .save_ppm(&output)
                .with_context(|| format!("write {}", output.display()))?;
            print!("{}", DebugTextRenderer::new().render(&frame));
            println!("wrote {width}x{height} frame to {}", output.display());
        }
        Commands::Simulate {
            config,
            entities,
            ticks,
            width,
            height,
            pointer,
        } => {
            let config = load_config(&config)?;
            let entities = load_entities(&entities)?;
            let pulse = config.markers.pulse;
            let phases: Vec<(String, f64)> = entities
                .iter()
                .enumerate()
                .map(|(i, e)| (e.id.to_string(), i as f64))
                .collect();

            let state = advance(&config, Extent::new(width, height), &pointer, ticks, |s| {
                let o = s.globe_orientation();
                let pulses: Vec<String> = phases
                    .iter()
                    .map(|(id, phase)| {
                        let p = s.pulse(*phase, &pulse);
                        format!("{id}={:.3}/{:.3}", p.scale, p.opacity)
                    })
                    .collect();
                println!(
                    "tick {:>4} t={:.3} yaw={:.5} pitch={:.5} stars={:.5} {}",
                    s.tick,
                    s.time,
                    o.yaw,
                    o.pitch,
                    s.star_yaw,
                    pulses.join(" ")
                );
            })?;
            println!("final state hash: {:#018x}", state.state_hash());
        }
    }

    Ok(())
}
