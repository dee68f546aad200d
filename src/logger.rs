use std::io::Write;

use log::LevelFilter;

/// Initialize the global logger backend.
///
/// Uses `env_logger` with a fixed format: timestamp, level, module target,
/// message. Without `verbose` the console only shows warnings and errors;
/// with it, everything down to `level` is mirrored. `RUST_LOG` still
/// overrides the configured level so individual subsystems can be turned
/// up without recompiling.
pub fn init(level: LevelFilter, verbose: bool) {
    let console_level = if verbose {
        level
    } else {
        level.min(LevelFilter::Warn)
    };
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .filter_level(console_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{:5}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Change the minimum log level at runtime (the `loglevel` shell command).
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

/// Current minimum log level.
pub fn level() -> LevelFilter {
    log::max_level()
}

/// Parse a level name as the shell and CLI accept it.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("WARN"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("warning"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("bogus"), None);
    }
}
