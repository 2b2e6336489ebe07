//! HIV-only events. HIV screening and linking are the shared
//! [`crate::event::screening::Screening`] and [`crate::event::linking::Linking`] built with
//! [`crate::event::policy::InfectionPolicy::HIV`].
mod infection;
mod treatment;

pub use infection::Infection;
pub use treatment::Treatment;
