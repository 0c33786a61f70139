use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use zoomstage::{Scene, Stage, StageOpts, TickOutcome};

#[derive(Parser, Debug)]
#[command(name = "zoomstage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the stage at a point in time as a PNG.
    Frame(FrameArgs),
    /// Print the overlay elements and frame stats at a point in time as JSON.
    Inspect(StageArgs),
}

#[derive(Parser, Debug)]
struct StageArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Milliseconds since the scene (or the chosen view) was entered.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Go to this view before rendering.
    #[arg(long)]
    view: Option<String>,

    /// Show every node in its resting state.
    #[arg(long, default_value_t = false)]
    no_animations: bool,

    /// Viewport width. Defaults to the scene's design width.
    #[arg(long)]
    width: Option<f64>,

    /// Viewport height. Defaults to the scene's design height.
    #[arg(long)]
    height: Option<f64>,

    /// Directory image sources are resolved against. Defaults to the scene's directory.
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    stage: StageArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

/// Build a stage and run it up to `args.time_ms`, loading requested images from disk.
fn run_stage(args: &StageArgs) -> anyhow::Result<(Stage, zoomstage::FrameStats)> {
    let json = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read scene '{}'", args.in_path.display()))?;
    let scene = Scene::from_json(&json)
        .with_context(|| format!("parse scene '{}'", args.in_path.display()))?;
    let assets_root = args.assets.clone().unwrap_or_else(|| {
        args.in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });

    let design = StageOpts::for_scene(&scene);
    let mut stage = Stage::new(
        scene,
        StageOpts {
            width: args.width.unwrap_or(design.width),
            height: args.height.unwrap_or(design.height),
            interactive: false,
            animations_enabled: !args.no_animations,
            ..design
        },
    )?;
    if let Some(view) = &args.view {
        stage.go_to_view(view, 0.0)?;
    }

    // The first tick requests images and starts entrances at t=0.
    tick(&mut stage, 0.0)?;
    if !stage.images().pending().is_empty() {
        stage.images_mut().load_pending_from_dir(&assets_root);
        tick(&mut stage, 0.0)?;
    }
    let stats = tick(&mut stage, args.time_ms)?;
    Ok((stage, stats))
}

fn tick(stage: &mut Stage, now_ms: f64) -> anyhow::Result<zoomstage::FrameStats> {
    match stage.tick(now_ms) {
        TickOutcome::Rendered(stats) => Ok(stats),
        TickOutcome::Halted => anyhow::bail!(
            "stage halted: {}",
            stage.halt_reason().unwrap_or("unknown error")
        ),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (stage, _stats) = run_stage(&args.stage)?;
    let frame = stage.snapshot()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_inspect(args: StageArgs) -> anyhow::Result<()> {
    let (stage, stats) = run_stage(&args)?;
    let report = serde_json::json!({
        "camera": stage.camera(),
        "stats": stats,
        "elements": stage.overlay().elements(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
