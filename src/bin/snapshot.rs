//! Headless renderer: run the field for a number of frames on an in-memory
//! surface and write the last one to a PNG.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use particle_field::{Bounds, FieldConfig, ParticleField, PixelSurface, Time};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

struct Options {
    output: PathBuf,
    frames: u32,
    width: u32,
    height: u32,
    config: Option<PathBuf>,
    seed: Option<u64>,
}

fn print_usage() {
    eprintln!(
        "Usage: snapshot [OPTIONS] [OUTPUT]

Render the particle field without a window and save the final frame.

Arguments:
  OUTPUT              PNG path (default: snapshot.png)

Options:
  --frames <N>        Frames to simulate (default: 120)
  --width <PX>        Surface width (default: 800)
  --height <PX>       Surface height (default: 600)
  --config <PATH>     JSON field config
  --seed <N>          Override the config's random seed
  -h, --help          Show this help"
    );
}

fn parse_value<T: FromStr>(args: &[String], i: &mut usize, name: &str) -> Option<T> {
    *i += 1;
    let Some(raw) = args.get(*i) else {
        eprintln!("Error: {name} requires a value");
        return None;
    };
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            eprintln!("Error: invalid value for {name}: {raw}");
            None
        }
    }
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        output: PathBuf::from("snapshot.png"),
        frames: 120,
        width: 800,
        height: 600,
        config: None,
        seed: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => options.frames = parse_value(&args, &mut i, "--frames")?,
            "--width" => options.width = parse_value(&args, &mut i, "--width")?,
            "--height" => options.height = parse_value(&args, &mut i, "--height")?,
            "--config" => options.config = Some(parse_value(&args, &mut i, "--config")?),
            "--seed" => options.seed = Some(parse_value(&args, &mut i, "--seed")?),
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {other}");
                print_usage();
                return None;
            }
            other => options.output = PathBuf::from(other),
        }
        i += 1;
    }
    Some(options)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let Some(options) = parse_args() else {
        return ExitCode::from(2);
    };

    let mut config = match &options.config {
        Some(path) => match FieldConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), "{}", e);
                return ExitCode::from(2);
            }
        },
        None => FieldConfig::default(),
    };
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }

    let mut surface = PixelSurface::new(options.width, options.height);
    let bounds = Bounds::from_size(options.width, options.height);
    let mut field = ParticleField::new(&config, bounds).with_time(Time::fixed(1.0 / 60.0));

    for _ in 0..options.frames {
        field.advance(&mut surface);
    }

    let links = field.last_stats().map_or(0, |s| s.links);
    match surface.save_png(&options.output) {
        Ok(()) => {
            info!(
                path = %options.output.display(),
                frames = options.frames,
                particles = field.len(),
                links,
                "snapshot written"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
