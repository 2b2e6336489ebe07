use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::error::HepceError;
use crate::log::LogConfiguration;

// ISO 8601 timestamp, colored level, target
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

const APPENDER: &str = "stderr";

impl LogConfiguration {
    /// Rebuilds the `log4rs` configuration and installs it, initializing the global logger on
    /// first use.
    pub(in crate::log) fn set_config(&mut self) -> Result<(), HepceError> {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        let loggers = self
            .module_filters
            .iter()
            .map(|(module, level)| Logger::builder().build(module.clone(), *level));
        let config = Config::builder()
            .appender(Appender::builder().build(APPENDER, Box::new(console)))
            .loggers(loggers)
            .build(Root::builder().appender(APPENDER).build(self.global_log_level))
            .map_err(|e| HepceError::HepceError(format!("invalid logging configuration: {e}")))?;

        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => {
                let handle = log4rs::init_config(config).map_err(|e| {
                    HepceError::HepceError(format!("could not install logger: {e}"))
                })?;
                self.handle = Some(handle);
            }
        }
        Ok(())
    }
}
