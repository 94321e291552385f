mod demo;

use std::path::PathBuf;

use anyhow::Context;
use cellops_input::{FrameInput, Signal};
use cellops_kernel::{GameConfig, Scene, SceneEvent};
use cellops_persist::{SceneDocument, SceneStore};
use cellops_render::{DebugTextRenderer, RenderFrame, Renderer};
use cellops_tools::SceneInspector;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellops-cli", about = "Headless runner for cellops scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Game config (YAML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective game config as YAML
    Config,
    /// Play the demo level headlessly
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "3600")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Damage the first live enemy every N frames (0 disables)
        #[arg(long, default_value = "10")]
        fire_every: u32,
        /// Print the final frame through the debug text renderer
        #[arg(long)]
        render: bool,
    },
    /// Save the demo level into a scene store
    Save {
        /// Store directory
        #[arg(short, long)]
        store: PathBuf,
        /// Scene name
        #[arg(short, long, default_value = "demo")]
        name: String,
    },
    /// Load a stored scene and print its entities
    Inspect {
        #[arg(short, long)]
        store: PathBuf,
        #[arg(short, long, default_value = "demo")]
        name: String,
        /// Also dump debug panels
        #[arg(long)]
        panels: bool,
    },
    /// Check that a scene file loads
    Validate {
        /// Path to a scene document
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            GameConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("cellops-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", cellops_common::crate_info());
            println!("ecs: {}", cellops_ecs::crate_info());
            println!("physics: {}", cellops_physics::crate_info());
            println!("input: {}", cellops_input::crate_info());
            println!("kernel: {}", cellops_kernel::crate_info());
            println!("persist: {}", cellops_persist::crate_info());
            println!("render: {}", cellops_render::crate_info());
            println!("tools: {}", cellops_tools::crate_info());
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Simulate {
            frames,
            dt,
            fire_every,
            render,
        } => {
            let mut scene = demo::build(config)?;
            tracing::debug!(entities = scene.entity_count(), "demo level built");
            simulate(&mut scene, frames, dt, fire_every);
            println!("{}", SceneInspector::summary(&scene));
            if render {
                print!("{}", DebugTextRenderer::new().render(&RenderFrame::capture(&scene)));
            }
        }
        Commands::Save { store, name } => {
            let scene = demo::build(config)?;
            let store = SceneStore::open(&store)?;
            let meta = store.save(&name, &scene)?;
            println!(
                "Saved `{name}`: entities={} lights={} sha256={}",
                meta.entity_count, meta.light_count, meta.sha256
            );
        }
        Commands::Inspect { store, name, panels } => {
            let store = SceneStore::open(&store)?;
            tracing::info!(root = %store.root().display(), %name, "inspecting stored scene");
            let mut scene = store
                .load(&name, config)
                .with_context(|| format!("loading scene `{name}`"))?;
            println!("{}", SceneInspector::summary(&scene));
            for info in SceneInspector::list_entities(&scene) {
                println!("  {info}");
            }
            if panels {
                print!("{}", SceneInspector::debug_panels(&mut scene));
            }
        }
        Commands::Validate { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let scene = SceneDocument::from_json_str(&text)
                .and_then(|doc| doc.restore(config))
                .with_context(|| format!("{} is not a loadable scene", path.display()))?;
            println!(
                "OK: {} entities, {} lights",
                scene.entity_count(),
                scene.lights().len()
            );
        }
    }

    Ok(())
}

/// Start the game on the first frame and run until `frames` or the game
/// ends, standing in for the player by shooting enemies at a fixed rate.
fn simulate(scene: &mut Scene, frames: u32, dt: f32, fire_every: u32) {
    let _span = tracing::info_span!("simulate", frames, dt, fire_every).entered();
    for frame in 0..frames {
        let mut input = FrameInput::new(dt);
        if frame == 0 {
            input.push(Signal::Start);
        }
        if fire_every > 0 && frame > 0 && frame % fire_every == 0 {
            if let Some(&enemy) = scene.enemies().first() {
                scene.apply_damage(enemy, 1.0);
            }
        }
        scene.frame(&input);

        for event in scene.drain_events() {
            match event {
                SceneEvent::RoundAdvanced { round } => println!("frame {frame}: round {round}"),
                SceneEvent::TargetDestroyed { guid } => {
                    println!("frame {frame}: target {} destroyed", guid.short())
                }
                SceneEvent::PlayStateChanged { to, .. } => println!("frame {frame}: {to}"),
                _ => {}
            }
        }
        if scene.state().is_ended() {
            tracing::info!(frame, state = %scene.state(), "game over");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_simulate_defaults() {
        let cli = Cli::try_parse_from(["cellops-cli", "simulate"]).unwrap();
        match cli.command {
            Commands::Simulate {
                frames, fire_every, ..
            } => {
                assert_eq!(frames, 3600);
                assert_eq!(fire_every, 10);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn simulate_starts_the_game() {
        let mut scene = demo::build(GameConfig::default()).unwrap();
        simulate(&mut scene, 5, 1.0 / 60.0, 0);
        assert!(scene.is_game_started());
        assert_eq!(scene.round(), 1);
    }

    #[test]
    fn saved_demo_validates() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::open(tmp.path()).unwrap();
        let scene = demo::build(GameConfig::default()).unwrap();
        store.save("demo", &scene).unwrap();

        let path = tmp.path().join("scenes").join("demo.scene.json");
        let text = std::fs::read_to_string(path).unwrap();
        let loaded = SceneDocument::from_json_str(&text)
            .unwrap()
            .restore(GameConfig::default())
            .unwrap();
        assert_eq!(loaded.entity_count(), scene.entity_count());
    }
}
