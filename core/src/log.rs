//! Logger and logging macros
//!
//! For the macros to properly compile, the calling crate must add a dependency to
//! crate log (ie. `log.workspace = true`).

use appender::AppenderSpec;
use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
use log::LevelFilter;
use log4rs::{Config, config::Root};

pub use logger::LogError;

mod appender;
mod consts;
mod logger;

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

fn build_config(log_dir: Option<&str>, filters: &str) -> Result<Config, LogError> {
    let mut stdout_appender = AppenderSpec::console(CONSOLE_APPENDER, None);
    let mut file_appenders = match log_dir {
        Some(log_dir) => vec![
            AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?,
            AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?,
        ],
        None => vec![],
    };
    let names = std::iter::once(stdout_appender.name).chain(file_appenders.iter().map(|x| x.name)).collect::<Vec<_>>();

    let loggers = logger::Builder::new()
        .root_level(LevelFilter::Info)
        .appenders(names.iter().copied())
        .parse_env(DEFAULT_LOGGER_ENV)
        .parse_expression(filters)
        .build();

    let mut config = Config::builder();
    for appender in std::iter::once(&mut stdout_appender).chain(file_appenders.iter_mut()).filter_map(|x| x.appender()) {
        config = config.appender(appender);
    }
    config
        .loggers(loggers.items())
        .build(Root::builder().appenders(names).build(loggers.root_level()))
        .map_err(|err| LogError::Config(err.to_string()))
}

/// Installs the global logger.
///
/// `filters` is a comma separated list of `level` or `target=level` directives,
/// merged on top of the `RUST_LOG` environment variable. When `log_dir` is provided,
/// size-rolled log files are written there in addition to the console.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let config = build_config(log_dir, filters)?;
    log4rs::init_config(config).map_err(|err| LogError::Config(err.to_string()))?;
    Ok(())
}

/// Tries to init the global logger, but does not panic if it was already setup.
/// Should be used for tests.
pub fn try_init_logger(filters: &str) {
    if let Ok(config) = build_config(None, filters) {
        let _ = log4rs::init_config(config);
    }
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => (
        log::trace!($($t)*)
    )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        log::debug!($($t)*)
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        log::info!($($t)*)
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        log::warn!($($t)*)
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        log::error!($($t)*)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_only_config_builds() {
        let config = build_config(None, "debug,nodelink_notify=trace").unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert!(config.loggers().iter().any(|x| x.name() == "nodelink_notify" && x.level() == LevelFilter::Trace));
    }

    #[test]
    fn test_try_init_logger_is_reentrant() {
        try_init_logger("info");
        try_init_logger("trace");
        crate::info!("logger initialized twice without panicking");
    }
}
