use std::io::Write;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// `-v` count to a level filter; quiet by default.
fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the stderr logger. `RUST_LOG`, when set, wins over `-v`.
pub fn init_logger(verbosity: u8) -> std::io::Result<()> {
    let mut builder = Builder::new();
    builder
        .filter_level(level_for(verbosity))
        .parse_env(Env::default())
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        });
    builder.try_init().map_err(std::io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }
}
