//! Substance use, treatment for opioid use disorder, overdoses and pregnancy.
mod behavior_changes;
mod moud;
mod overdose;
mod pregnancy;

pub use behavior_changes::BehaviorChanges;
pub use moud::Moud;
pub use overdose::Overdose;
pub use pregnancy::Pregnancy;
