//! atmosfx - headless scene runner
//!
//! Loads a scene (or the built-in demo), mounts it on an in-memory host and
//! steps it at a fixed timestep.
//!
//! Usage: `atmosfx [scene.toml] [--frames N] [--fps F] [--json]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use atmosfx::host::headless::HeadlessScene;
use atmosfx::{EffectStage, SceneConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug)]
struct Args {
    scene: Option<PathBuf>,
    frames: u32,
    fps: f32,
    json: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            scene: None,
            frames: 600,
            fps: 60.0,
            json: false,
        }
    }
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--frames" => {
                let value = it.next().context("--frames needs a value")?;
                args.frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count: {value}"))?;
            }
            "--fps" => {
                let value = it.next().context("--fps needs a value")?;
                args.fps = value
                    .parse()
                    .with_context(|| format!("invalid fps: {value}"))?;
                if args.fps <= 0.0 {
                    bail!("fps must be positive");
                }
            }
            "--json" => args.json = true,
            other if other.starts_with("--") => bail!("unknown flag: {other}"),
            path => args.scene = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting atmosfx v{}", env!("CARGO_PKG_VERSION"));

    let args = parse_args()?;
    let scene_config = match &args.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => {
            tracing::info!("No scene given, using the built-in demo");
            SceneConfig::demo()
        }
    };

    let mut host = HeadlessScene::new(scene_config.viewport);
    let mut stage = EffectStage::new();
    let mounted = stage
        .mount_scene(&mut host, &scene_config)
        .context("failed to mount scene")?;
    tracing::info!(mounted, frames = args.frames, fps = args.fps, "Scene mounted");

    let dt = 1.0 / args.fps;
    let frames_per_report = args.fps.round().max(1.0) as u32;
    let mut elapsed = 0.0;

    for frame in 1..=args.frames {
        elapsed += dt;
        stage.update(&mut host, elapsed, dt);

        if frame % frames_per_report == 0 {
            log_stats(&stage, elapsed);
        }
    }

    if args.json {
        let snapshot = host.snapshot();
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?
        );
    }

    stage.destroy(&mut host);
    Ok(())
}

fn log_stats(stage: &EffectStage, elapsed: f32) {
    for name in stage.names() {
        let Some(effect) = stage.get(name) else {
            continue;
        };
        if let Some(leaves) = effect.as_leaves() {
            tracing::info!(t = elapsed, name, leaves = leaves.leaf_count(), "Leaves");
        } else if let Some(embers) = effect.as_embers() {
            tracing::info!(t = elapsed, name, visible = embers.visible_count(), "Embers");
        } else if let Some(swarm) = effect.as_fireflies() {
            tracing::info!(t = elapsed, name, visible = swarm.visible_count(), "Fireflies");
        } else if let Some(sun) = effect.as_sun() {
            tracing::info!(
                t = elapsed,
                name,
                center = ?sun.center(),
                speckles = sun.alive_speckles(),
                wisps = sun.alive_wisps(),
                "Sun"
            );
        } else if let Some(flare) = effect.as_lens_flare() {
            tracing::info!(t = elapsed, name, visible = flare.is_visible(), "Lens flare");
        }
    }
}
