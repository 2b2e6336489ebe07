//! HCV-only events. Screening and linking for HCV are the shared
//! [`crate::event::screening::Screening`] and [`crate::event::linking::Linking`] built with
//! [`crate::event::policy::InfectionPolicy::HCV`].
mod clearance;
mod infection;
mod treatment;
mod voluntary_relink;

pub use clearance::Clearance;
pub use infection::Infection;
pub use treatment::Treatment;
pub use voluntary_relink::VoluntaryRelink;
