//! `nativebuild_log`:
//! Logger setup and the stage banners printed while a build runs.

use std::io::Write;

use env_logger::{Builder, Env};
use log::Level;

/// Default filter for a given `-v` count.
pub fn derive_default_filter(n_verbosity: u8) -> &'static str {
    match n_verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialise the global logger once.
///
/// `RUST_LOG` wins over `n_verbosity`. Info records are printed bare so stage
/// banners read like plain console output; every other level carries its
/// level and target.
pub fn init_logger(n_verbosity: u8) {
    let env = Env::default().default_filter_or(derive_default_filter(n_verbosity));
    let _ = Builder::from_env(env)
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "[{level} {}] {}", record.target(), record.args()),
        })
        .try_init();
}

/// Announce the start of a build stage.
pub fn intro(title: &str) {
    log::info!("{}", format_intro(title));
}

/// Report the outcome of a build stage.
pub fn note(message: &str) {
    log::info!("{}", format_note(message));
}

fn format_intro(title: &str) -> String {
    format!("\n ==> {title}")
}

fn format_note(message: &str) -> String {
    format!("     {message}")
}
