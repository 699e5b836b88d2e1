#![deny(unsafe_code)]
//! CLI binary for the lava-lamp metaball engine.
//!
//! Subcommands:
//! - `render`: run the lamp headlessly for N frames, write PNG(s)
//! - `presets`: print the default layer table

mod error;
mod schedule;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{info, warn};

use error::CliError;
use lava_lamp_core::{EngineError, LampConfig, LayerConfig, Srgb};
use lava_lamp_metaball::{FrameBudget, FrameLoop, Lamp, ResizeEvent};
use lava_lamp_raster::{write_png, PixelCanvas};
use schedule::ScheduledResize;

#[derive(Parser)]
#[command(name = "lava-lamp", about = "Metaball lava-lamp renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Animate the lamp for N frames and write the last one as a PNG.
    Render {
        /// Logical canvas width (overrides the config).
        #[arg(short = 'W', long)]
        width: Option<usize>,

        /// Logical canvas height (overrides the config).
        #[arg(short = 'H', long)]
        height: Option<usize>,

        /// Device pixels per logical pixel (overrides the config).
        #[arg(long)]
        pixel_ratio: Option<f64>,

        /// Number of frames to animate.
        #[arg(short, long, default_value_t = 120)]
        frames: u64,

        /// PRNG seed (overrides the config).
        #[arg(long)]
        seed: Option<u64>,

        /// Lamp config as a JSON file; defaults to the ten preset layers.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Config overrides as a JSON string, e.g. '{"grid_step": 6}'.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Resize to WxH (logical) once FRAME frames are done. Repeatable.
        #[arg(long = "resize-at", value_name = "FRAME:WxH")]
        resize_at: Vec<ScheduledResize>,

        /// Background the PNG is flattened onto.
        #[arg(long, default_value = "#000000")]
        background: String,

        /// Output file path.
        #[arg(short, long, default_value = "lava-lamp.png")]
        output: PathBuf,

        /// Also write every frame as frame_NNNNN.png into this directory.
        #[arg(long)]
        sequence: Option<PathBuf>,
    },
    /// Print the default layer presets.
    Presets,
}

struct RenderArgs {
    width: Option<usize>,
    height: Option<usize>,
    pixel_ratio: Option<f64>,
    frames: u64,
    seed: Option<u64>,
    config: Option<PathBuf>,
    params: String,
    resize_at: Vec<ScheduledResize>,
    background: String,
    output: PathBuf,
    sequence: Option<PathBuf>,
}

fn build_config(args: &RenderArgs) -> Result<LampConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => LampConfig::load(path)?,
        None => LampConfig::default(),
    };
    let params: serde_json::Value =
        serde_json::from_str(&args.params).map_err(CliError::Params)?;
    config.apply_params(&params)?;
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(ratio) = args.pixel_ratio {
        config.pixel_ratio = ratio;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn frame_path(dir: &Path, frame: u64) -> PathBuf {
    dir.join(format!("frame_{frame:05}.png"))
}

fn render(args: RenderArgs, json: bool) -> Result<(), CliError> {
    let config = build_config(&args)?;
    let background = Srgb::from_hex(&args.background).map_err(|source| CliError::Background {
        value: args.background.clone(),
        source,
    })?;
    if let Some(dir) = &args.sequence {
        fs::create_dir_all(dir).map_err(|source| CliError::SequenceDir {
            path: dir.clone(),
            source,
        })?;
    }

    let (device_w, device_h) = config.device_size();
    let mut canvas = PixelCanvas::new(device_w as usize, device_h as usize)?;
    let mut lamp = Lamp::for_surface(config.clone(), &canvas)?;

    let mut frame_loop = FrameLoop::new(FrameBudget::new(args.frames));
    let cancel = frame_loop.cancel_handle();
    let resizes = frame_loop.resize_sender();
    let send_due = |done: u64| {
        for r in args.resize_at.iter().filter(|r| r.frame == done) {
            let (width, height) = r.device_size(config.pixel_ratio);
            info!("resizing to {r} ({width}x{height} device pixels)");
            if resizes.send(ResizeEvent { width, height }).is_err() {
                warn!("frame loop gone, dropping resize {r}");
            }
        }
    };
    send_due(0);

    let mut write_error: Option<EngineError> = None;
    let stats = frame_loop.run(&mut lamp, &mut canvas, |frame, canvas| {
        if let Some(dir) = &args.sequence {
            if let Err(e) = write_png(canvas, Some(background), &frame_path(dir, frame)) {
                write_error = Some(e);
                cancel.cancel();
                return;
            }
        }
        send_due(frame);
    });
    if let Some(e) = write_error {
        return Err(e.into());
    }

    write_png(&canvas, Some(background), &args.output)?;

    let (final_w, final_h) = lamp.size();
    if json {
        let info = serde_json::json!({
            "width": config.width,
            "height": config.height,
            "pixel_ratio": config.pixel_ratio,
            "device_width": final_w,
            "device_height": final_h,
            "frames": stats.frames,
            "resizes": stats.resizes,
            "seed": config.seed,
            "layers": lamp.layers().len(),
            "trace": lamp.last_stats(),
            "output": args.output.display().to_string(),
            "sequence": args.sequence.as_ref().map(|d| d.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {} frames ({final_w}x{final_h}, {} layers, seed {}) -> {}",
            stats.frames,
            lamp.layers().len(),
            config.seed,
            args.output.display()
        );
    }
    Ok(())
}

fn presets(json: bool) -> Result<(), CliError> {
    let layers = LayerConfig::presets();
    if json {
        println!("{}", serde_json::to_string_pretty(&layers)?);
    } else {
        println!("layer  balls  speed  colors");
        for (i, layer) in layers.iter().enumerate() {
            let colors: Vec<String> = layer.colors.iter().map(|c| c.to_hex()).collect();
            println!(
                "{i:>5}  {:>5}  {:>5.1}  {}",
                layer.balls,
                layer.speed,
                colors.join(" ")
            );
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Presets => presets(cli.json),
        Command::Render {
            width,
            height,
            pixel_ratio,
            frames,
            seed,
            config,
            params,
            resize_at,
            background,
            output,
            sequence,
        } => render(
            RenderArgs {
                width,
                height,
                pixel_ratio,
                frames,
                seed,
                config,
                params,
                resize_at,
                background,
                output,
                sequence,
            },
            cli.json,
        ),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
