/// Glue between parsed commands, the engine and the terminal
use crate::command::{Command, HELP};
use harbor_playback::{format_clock, PlaybackEngine, PlaybackEvent, Result, TransportState};
use std::fmt::Write as _;

/// Whether the interactive loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command against the engine, returning what to print
pub fn execute(engine: &PlaybackEngine, command: Command) -> Result<(Flow, Option<String>)> {
    let output = match command {
        Command::Toggle => {
            engine.toggle_play_pause()?;
            None
        }
        Command::Next => {
            engine.skip_next()?;
            None
        }
        Command::Previous => {
            engine.skip_previous()?;
            None
        }
        Command::Stop => {
            engine.stop();
            None
        }
        Command::Seek(seconds) => {
            let target = engine.seek(seconds)?;
            Some(format!("-> {}", format_clock(target)))
        }
        Command::Volume(percent) => {
            engine.set_volume(percent / 100.0);
            None
        }
        Command::Mute => {
            engine.toggle_mute();
            None
        }
        Command::Favorite => {
            let favorite = engine.toggle_favorite()?;
            Some(if favorite { "★ favorite" } else { "☆ not a favorite" }.to_string())
        }
        Command::Jump(number) => {
            let queue = engine.queue();
            match number.checked_sub(1).and_then(|index| queue.get(index)) {
                Some(track) => {
                    engine.play_track_id(&track.id)?;
                    None
                }
                None => Some(format!("queue has {} entries", queue.len())),
            }
        }
        Command::Status => Some(status_line(engine)),
        Command::Queue => Some(queue_listing(engine)),
        Command::Help => Some(HELP.to_string()),
        Command::Quit => {
            engine.stop();
            return Ok((Flow::Quit, None));
        }
    };
    Ok((Flow::Continue, output))
}

/// One-line summary of what is playing
pub fn status_line(engine: &PlaybackEngine) -> String {
    let Some(track) = engine.current_track() else {
        return "nothing loaded".to_string();
    };

    let progress = engine.progress();
    let volume = engine.volume();
    let mut line = format!(
        "[{}] {} - {}  {} / {}  vol {:.0}%",
        state_label(engine.state()),
        track.artist,
        track.title,
        format_clock(progress.elapsed),
        format_clock(engine.duration()),
        volume.level() * 100.0
    );
    if volume.is_muted() {
        line.push_str(" (muted)");
    }
    if engine.is_favorite().unwrap_or(false) {
        line.push_str(" ★");
    }
    line
}

fn queue_listing(engine: &PlaybackEngine) -> String {
    let queue = engine.queue();
    if queue.is_empty() {
        return "queue is empty".to_string();
    }

    let current = engine.queue_index();
    let mut listing = String::new();
    for (index, track) in queue.iter().enumerate() {
        let marker = if index == current { '>' } else { ' ' };
        let _ = writeln!(
            listing,
            "{marker} {:>3}. {} - {}",
            index + 1,
            track.artist,
            track.title
        );
    }
    listing.trim_end().to_string()
}

fn state_label(state: TransportState) -> &'static str {
    match state {
        TransportState::Idle => "idle",
        TransportState::Loading => "loading",
        TransportState::Playing => "playing",
        TransportState::Paused => "paused",
        TransportState::Ended => "ended",
        TransportState::Failed => "failed",
    }
}

/// Human readable line for an event, if it is worth printing
///
/// Progress ticks are not printed; `i` shows the position on demand.
pub fn describe(event: &PlaybackEvent) -> Option<String> {
    match event {
        PlaybackEvent::TrackChanged { track } => {
            Some(format!("♪ {} - {}", track.artist, track.title))
        }
        PlaybackEvent::StateChanged { state } => match state {
            TransportState::Paused | TransportState::Ended | TransportState::Failed => {
                Some(format!("[{}]", state_label(*state)))
            }
            _ => None,
        },
        PlaybackEvent::DurationResolved { duration, .. } => {
            Some(format!("  length {}", format_clock(*duration)))
        }
        PlaybackEvent::VolumeChanged { level, muted } => Some(if *muted {
            "volume muted".to_string()
        } else {
            format!("volume {:.0}%", level * 100.0)
        }),
        PlaybackEvent::ArtworkReady {
            has_artwork: true, ..
        } => Some("  cover art loaded".to_string()),
        PlaybackEvent::Error { message } => Some(format!("error: {message}")),
        PlaybackEvent::ProgressUpdated { .. }
        | PlaybackEvent::TrackFinished { .. }
        | PlaybackEvent::ArtworkReady { .. }
        | PlaybackEvent::QueueChanged { .. }
        | PlaybackEvent::FavoriteChanged { .. } => None,
    }
}
