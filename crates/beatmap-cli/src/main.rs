// beatmap-timeline: inspect the control points and hitsound timeline of a beatmap

mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beatmap_model::{Timing, parse_hit_objects, parse_timing, write_timing_points};
use beatmap_timeline::{Timeline, TimelineConfig};
use clap::{Parser, Subcommand};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "beatmap-timeline",
    about = "Inspect control points and hitsound timelines of a beatmap"
)]
struct Args {
    /// Path to timeline config JSON file.
    #[arg(long, default_value = "timeline.json", global = true)]
    config: PathBuf,

    /// Show debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List control points with their BPM or slider velocity.
    Points { beatmap: PathBuf },

    /// Snap greenlines onto the beat grid and print the new `[TimingPoints]` body.
    Resnap {
        beatmap: PathBuf,

        /// First beat divisor.
        #[arg(long, default_value_t = 16)]
        divisor: i32,

        /// Second beat divisor.
        #[arg(long, default_value_t = 12)]
        divisor2: i32,

        /// Keep fractional milliseconds instead of flooring.
        #[arg(long)]
        no_floor: bool,
    },

    /// Print hitsound events with their governing control points.
    Events {
        beatmap: PathBuf,

        /// Only events at or after this time (ms).
        #[arg(long, allow_negative_numbers = true)]
        start: Option<f64>,

        /// Only events at or before this time (ms).
        #[arg(long, allow_negative_numbers = true)]
        end: Option<f64>,
    },

    /// Print the event closest to a time.
    Nearest {
        beatmap: PathBuf,

        /// Time in milliseconds.
        #[arg(allow_negative_numbers = true)]
        time: f64,

        /// Skip edges that cannot be copied (spinner heads, hold note tails).
        #[arg(long)]
        copyable: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = TimelineConfig::load_from(&args.config)?;

    match args.command {
        Command::Points { beatmap } => {
            let timing = parse_timing(&read_beatmap(&beatmap)?)?;
            let (report, redundant) = report::points_report(&timing);
            print!("{report}");
            if redundant > 0 {
                warn!("{redundant} control points repeat the effect of the point before them");
            }
        }
        Command::Resnap {
            beatmap,
            divisor,
            divisor2,
            no_floor,
        } => {
            let timing = parse_timing(&read_beatmap(&beatmap)?)?;
            let (points, moved) =
                report::resnap_greenlines(&timing, divisor, divisor2, !no_floor)?;
            info!("Resnapped {moved} greenlines to 1/{divisor} and 1/{divisor2}");
            print!("{}", write_timing_points(&points));
        }
        Command::Events {
            beatmap,
            start,
            end,
        } => {
            let (timeline, timing) = load_timeline(&beatmap, config)?;
            let start = start.unwrap_or(f64::NEG_INFINITY);
            let end = end.unwrap_or(f64::INFINITY);
            print!("{}", report::events_report(&timeline, &timing, start, end));
        }
        Command::Nearest {
            beatmap,
            time,
            copyable,
        } => {
            let (timeline, timing) = load_timeline(&beatmap, config)?;
            match timeline.nearest_event(time, copyable) {
                Some(event) => println!("{}", report::event_line(event, &timing)),
                None => println!("No events"),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn read_beatmap(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read beatmap: {}", path.display()))
}

fn load_timeline(path: &Path, config: TimelineConfig) -> Result<(Timeline, Timing)> {
    let content = read_beatmap(path)?;
    let timing = parse_timing(&content)
        .with_context(|| format!("Invalid timing points in {}", path.display()))?;
    let mut objects = parse_hit_objects(&content)
        .with_context(|| format!("Invalid hit objects in {}", path.display()))?;

    let mut timeline = Timeline::build_with_config(&mut objects, &timing, config)
        .with_context(|| format!("Failed to build timeline for {}", path.display()))?;
    timeline.attach_control_points(&timing)?;
    info!(
        "Loaded {} hit objects, {} events from {}",
        objects.len(),
        timeline.len(),
        path.display()
    );
    Ok((timeline, timing))
}
