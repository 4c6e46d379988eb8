use crate::sink::{Sink, Timestamp};
use crate::LogLevel;
use colored::{Color, Colorize};

/// Prints formatted lines to stdout, with the level token colored.
///
/// Output shape: `[2024-06-08 14:22:31 +0200] [INFO ]: hello 42`. The token
/// is padded to 5 characters *before* coloring so the ANSI escapes do not
/// disturb the column layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Trace => Color::White,
        LogLevel::Debug => Color::BrightBlack,
        LogLevel::Info => Color::Green,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Error => Color::Red,
        LogLevel::Critical => Color::TrueColor { r: 139, g: 0, b: 0 },
    }
}

impl Sink for ConsoleSink {
    fn receive(&self, level: LogLevel, timestamp: Timestamp, line: &str) {
        let token = format!("{:<5}", level.as_str()).color(level_color(level));
        println!(
            "[{}] [{}]: {}",
            timestamp.format("%Y-%m-%d %H:%M:%S %z"),
            token,
            line
        );
    }
}
