//! Logger setup for the panel binary and the test suite.

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the terminal logger. Debug level in debug builds, info in release.
pub fn init() -> Result<(), log::SetLoggerError> {
    CombinedLogger::init(vec![TermLogger::new(
        default_level(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
}

/// Initializes a terminal logger for tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    let _ = init();
}
