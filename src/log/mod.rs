//! Diagnostic logging.
//!
//! Every module logs through the five `log` macros re-exported here. Output is off until a level
//! is set, either in code or from the `log` section of a run configuration:
//!
//! ```rust
//! use hepce::config::Config;
//! use hepce::log::{configure_from, set_module_filter, LevelFilter};
//!
//! let config = Config::new()
//!     .with("log.level", "info")
//!     .with("log.quiet_modules", "hepce::data");
//! configure_from(&config);
//! // Per-person event traces for just the treatment events.
//! set_module_filter("hepce::event::treatment", LevelFilter::Trace);
//! ```
//!
//! Table loads log at `debug`, missing inputs at `warn`, data-source failures at `error` and
//! per-person event outcomes at `trace`.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::collections::hash_map::Entry;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

pub use log::{debug, error, info, trace, warn, LevelFilter};

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::HashMap;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The process-wide level settings. Only the free functions below touch it.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Applies to every target without a filter of its own. `Off` silences everything.
    pub(in crate::log) global_log_level: LevelFilter,
    /// module path → level
    pub(in crate::log) module_filters: HashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    handle: Option<log4rs::Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        LogConfiguration {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_filters: HashMap::default(),
            #[cfg(feature = "logging")]
            handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.apply();
    }

    /// Returns whether anything changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_filters.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == level {
                    return false;
                }
                entry.insert(level);
            }
            Entry::Vacant(entry) => {
                entry.insert(level);
            }
        }
        true
    }

    fn set_module_filters(&mut self, filters: &[(&str, LevelFilter)]) {
        let mut changed = false;
        for (module, level) in filters {
            changed |= self.insert_module_filter(module, *level);
        }
        if changed {
            self.apply();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_filters.remove(module).is_some() {
            self.apply();
        }
    }

    /// Installs the settings, logging to stderr if the backend rejects them.
    fn apply(&mut self) {
        if let Err(e) = self.set_config() {
            eprintln!("hepce: could not configure logging: {e}");
        }
    }
}

/// Turns on every message. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Same as `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Overrides the global level for `module_path` and everything below it.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level)]);
}

/// Bulk form of [`set_module_filter`]; the logger is rebuilt once.
pub fn set_module_filters(filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(filters);
}

/// Returns `module_path` to the global level.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Applies the `log` configuration section:
/// - `log.level`: global level name (`off`, `error`, `warn`, `info`, `debug`, `trace`)
/// - `log.quiet_modules`: module paths silenced regardless of the global level
///
/// A missing or unrecognized level leaves logging off.
pub fn configure_from(config: &dyn ConfigSource) {
    let level = config.get_string("log.level");
    let level = LevelFilter::from_str(&level).unwrap_or(DEFAULT_LOG_LEVEL);
    let quiet = config.get_vec::<String>("log.quiet_modules");
    let filters: Vec<(&str, LevelFilter)> = quiet
        .iter()
        .map(|module| (module.as_str(), LevelFilter::Off))
        .collect();
    let mut log_configuration = get_log_configuration();
    log_configuration.set_module_filters(&filters);
    log_configuration.set_log_level(level);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    // The configuration is global; run these one at a time.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn global_level_round_trips() {
        let _guard = TEST_MUTEX.lock().unwrap();
        set_log_level(LevelFilter::Error);
        assert_eq!(
            get_log_configuration().global_log_level,
            LevelFilter::Error
        );
        error!("emitted at error");
        trace!("not emitted");
        enable_logging();
        assert_eq!(
            get_log_configuration().global_log_level,
            LevelFilter::Trace
        );
        disable_logging();
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn module_filters_are_replaced_and_removed() {
        let _guard = TEST_MUTEX.lock().unwrap();
        set_module_filters(&[
            ("hepce::data", LevelFilter::Warn),
            ("hepce::event", LevelFilter::Debug),
        ]);
        set_module_filter("hepce::data", LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(
                config.module_filters.get("hepce::data"),
                Some(&LevelFilter::Error)
            );
            assert_eq!(
                config.module_filters.get("hepce::event"),
                Some(&LevelFilter::Debug)
            );
        }
        remove_module_filter("hepce::data");
        remove_module_filter("hepce::event");
        assert!(get_log_configuration().module_filters.is_empty());
    }

    #[test]
    fn configure_from_log_section() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let config = Config::new()
            .with("log.level", "Info")
            .with("log.quiet_modules", "hepce::population, hepce::data");
        configure_from(&config);
        {
            let log_configuration = get_log_configuration();
            assert_eq!(log_configuration.global_log_level, LevelFilter::Info);
            assert_eq!(
                log_configuration.module_filters.get("hepce::population"),
                Some(&LevelFilter::Off)
            );
        }
        remove_module_filter("hepce::population");
        remove_module_filter("hepce::data");

        configure_from(&Config::new().with("log.level", "loud"));
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }
}
