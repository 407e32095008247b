//! Logging setup for the dupemgr binary.
//!
//! The library only talks to the `log` facade. The binary installs an
//! `env_logger` backend whose level comes from (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! What each level carries:
//!
//! - `info`: removals and their summaries
//! - `debug`: targets ("will check", "will avoid", "will ignore ... portion of")
//!   and each match as it is found
//! - `trace`: every pair compared and every path filtered out
//!
//! Debug builds prefix records with a timestamp (and the module path when
//! verbose); release builds print level and message only.

use std::env;
use std::io::Write;

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

/// Initialize the logging subsystem from CLI verbosity flags.
///
/// Call once, before anything logs. A second call is a no-op.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
/// * `no_color` - Never color level names
///
/// # Example
///
/// ```rust,no_run
/// use dupemgr::logging::init_logging;
///
/// init_logging(1, false, false);
/// log::debug!("  will check /incoming");
/// ```
pub fn init_logging(verbose: u8, quiet: bool, no_color: bool) {
    let from_env = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match from_env {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    if no_color {
        builder.write_style(WriteStyle::Never);
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }
    match from_env {
        Some(spec) => log::debug!("Logging initialized from RUST_LOG={spec}"),
        None => log::debug!("Logging initialized at level: {}", log::max_level()),
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(buf, "{level_style}{:<5}{level_style:#} {}", level, record.args())
        });
    }
}
