/// Harbor - terminal music player
use anyhow::Context;
use clap::{Parser, Subcommand};
use harbor_artwork::load_backdrop;
use harbor_audio_desktop::CpalHost;
use harbor_cli::{config::AppConfig, describe, execute, library, status_line, Command, Flow};
use harbor_core::{Catalog, MemoryCatalog, Track, TrackId};
use harbor_playback::{AudioHost, PlaybackEngine};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harbor")]
#[command(about = "Harbor terminal music player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play files or directories
    Play {
        /// Files or directories (defaults to library.directories)
        paths: Vec<PathBuf>,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Queue entry to start with (1-based)
        #[arg(short, long, default_value_t = 1)]
        start: usize,
        /// Initial volume, 0-100
        #[arg(short, long)]
        volume: Option<f32>,
    },
    /// List audio output devices
    Devices,
    /// Render the blurred backdrop for a cover image
    Backdrop {
        /// Cover image
        image: PathBuf,
        /// Where to write the backdrop (PNG/JPEG by extension)
        output: PathBuf,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harbor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            paths,
            config,
            start,
            volume,
        } => play(paths, config, start, volume)?,
        Commands::Devices => {
            let devices = CpalHost::output_devices().context("listing output devices")?;
            if devices.is_empty() {
                println!("No output devices found");
            }
            for name in devices {
                println!("{name}");
            }
        }
        Commands::Backdrop {
            image,
            output,
            config,
        } => {
            let config = AppConfig::load(config.as_deref())?;
            let track = Track::new(TrackId::generate(), "cover", "", &image).with_artwork(&image);
            let backdrop = load_backdrop(&track, &config.playback.artwork);
            let blurred = backdrop
                .blurred
                .with_context(|| format!("could not decode {}", image.display()))?;
            blurred
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "Wrote {}x{} backdrop to {}",
                blurred.width(),
                blurred.height(),
                output.display()
            );
        }
    }

    Ok(())
}

fn play(
    paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    start: usize,
    volume: Option<f32>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(volume) = volume {
        config.playback.initial_volume = (volume / 100.0).clamp(0.0, 1.0);
    }

    let paths = if paths.is_empty() {
        config.library.directories.clone()
    } else {
        paths
    };
    if paths.is_empty() {
        anyhow::bail!("nothing to play: pass files or set library.directories");
    }

    let tracks = library::scan(&paths, &config.library.extensions)?;
    if tracks.is_empty() {
        anyhow::bail!("no playable files found");
    }

    let host: Arc<dyn AudioHost> = match &config.audio.device {
        Some(hint) => Arc::new(CpalHost::with_device(hint.clone())),
        None => Arc::new(CpalHost::new()),
    };
    let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::with_tracks(tracks.clone()));
    let engine = PlaybackEngine::new(host, Some(catalog), config.playback.clone())?;

    let events = engine.subscribe();
    std::thread::Builder::new()
        .name("harbor-events".to_string())
        .spawn(move || {
            for event in events {
                if let Some(line) = describe(&event) {
                    println!("{line}");
                }
            }
        })
        .context("spawning event printer")?;

    let count = tracks.len();
    println!("{count} tracks queued. h for help.");
    if let Err(e) = engine.play_queue(tracks, start.saturating_sub(1).min(count - 1)) {
        println!("error: {e}");
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match execute(&engine, command) {
            Ok((flow, output)) => {
                if let Some(output) = output {
                    println!("{output}");
                }
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(e) => println!("error: {e}"),
        }
        std::io::stdout().flush()?;
    }

    println!("{}", status_line(&engine));
    Ok(())
}
