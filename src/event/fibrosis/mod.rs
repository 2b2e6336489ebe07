//! Liver disease: true fibrosis progression and clinical staging.
mod progression;
mod staging;

pub use progression::FibrosisProgression;
pub use staging::FibrosisStaging;
