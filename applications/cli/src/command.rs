/// Interactive commands read from stdin
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Play/pause toggle
    Toggle,
    Next,
    Previous,
    Stop,
    /// Seek to an absolute position in seconds
    Seek(f64),
    /// Set volume, 0-100
    Volume(f32),
    Mute,
    Favorite,
    /// Jump to a queue entry (1-based)
    Jump(usize),
    Status,
    Queue,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  p, space      play / pause
  n             next track
  b             previous track (restarts if more than 3s in)
  s             stop
  seek <secs>   jump to position, e.g. 'seek 90' or 'seek 1:30'
  vol <0-100>   set volume
  m             mute / unmute
  f             toggle favorite
  j <n>         play queue entry n
  i             show current track and position
  l             list the queue
  h             this help
  q             quit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Toggle);
        }

        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();

        let command = match verb.as_str() {
            "p" | "play" | "pause" => Command::Toggle,
            "n" | "next" => Command::Next,
            "b" | "prev" | "previous" => Command::Previous,
            "s" | "stop" => Command::Stop,
            "m" | "mute" => Command::Mute,
            "f" | "fav" | "favorite" => Command::Favorite,
            "i" | "info" | "status" => Command::Status,
            "l" | "ls" | "queue" => Command::Queue,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            "seek" => Command::Seek(parse_position(arg.ok_or("seek needs a position")?)?),
            "vol" | "volume" => {
                let level: f32 = arg
                    .ok_or("vol needs a level")?
                    .parse()
                    .map_err(|_| "volume must be a number".to_string())?;
                Command::Volume(level.clamp(0.0, 100.0))
            }
            "j" | "jump" => {
                let index: usize = arg
                    .ok_or("jump needs a queue number")?
                    .parse()
                    .map_err(|_| "queue number must be a positive integer".to_string())?;
                if index == 0 {
                    return Err("queue numbers start at 1".to_string());
                }
                Command::Jump(index)
            }
            other => return Err(format!("unknown command '{other}' (h for help)")),
        };
        Ok(command)
    }
}

/// Parse `90`, `90.5` or `1:30` into seconds
fn parse_position(arg: &str) -> Result<f64, String> {
    let invalid = || format!("invalid position '{arg}'");
    match arg.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: f64 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            Ok(minutes * 60.0 + seconds)
        }
        None => arg.parse().map_err(|_| invalid()),
    }
}
