//! Stand-in backend when the `logging` feature is off. Nothing is printed; the level still gates
//! the `log` macros.
use crate::error::HepceError;
use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) -> Result<(), HepceError> {
        log::set_max_level(self.global_log_level);
        Ok(())
    }
}
