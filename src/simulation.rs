//! Builds the configured event sequence and steps a population through it.
//!
//! Each month every living person passes through every event, in the order listed under
//! `simulation.events`.
use std::str::FromStr;

use log::{debug, info};
use strum::{Display, EnumIter, EnumString};

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::StratifiedSource;
use crate::error::HepceError;
use crate::event::aging::Aging;
use crate::event::behavior::{BehaviorChanges, Moud, Overdose, Pregnancy};
use crate::event::death::Death;
use crate::event::fibrosis::{FibrosisProgression, FibrosisStaging};
use crate::event::linking::Linking;
use crate::event::policy::InfectionPolicy;
use crate::event::screening::Screening;
use crate::event::{hcv, hiv, Event};
use crate::person::Person;
use crate::sampler::Sampler;

/// The names accepted in `simulation.events`, matched ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum EventKind {
    Aging,
    BehaviorChanges,
    Clearance,
    Death,
    FibrosisProgression,
    FibrosisStaging,
    Infections,
    #[strum(serialize = "HIVInfections")]
    HIVInfections,
    Screening,
    #[strum(serialize = "HIVScreening")]
    HIVScreening,
    Linking,
    #[strum(serialize = "HIVLinking")]
    HIVLinking,
    Treatment,
    #[strum(serialize = "HIVTreatment")]
    HIVTreatment,
    VoluntaryRelinking,
    #[strum(serialize = "MOUD")]
    MOUD,
    Overdose,
    Pregnancy,
}

/// Builds the event named by `kind`, loading its tables from `source`.
///
/// # Errors
/// Propagates any construction error of the event.
pub fn create_event(
    kind: EventKind,
    config: &dyn ConfigSource,
    source: &dyn StratifiedSource,
) -> Result<Box<dyn Event>, HepceError> {
    debug!("Creating event {kind}");
    let event: Box<dyn Event> = match kind {
        EventKind::Aging => Box::new(Aging::new(config, source)?),
        EventKind::BehaviorChanges => Box::new(BehaviorChanges::new(config, source)?),
        EventKind::Clearance => Box::new(hcv::Clearance::new(config)?),
        EventKind::Death => Box::new(Death::new(config, source)?),
        EventKind::FibrosisProgression => Box::new(FibrosisProgression::new(config, source)?),
        EventKind::FibrosisStaging => Box::new(FibrosisStaging::new(config, source)?),
        EventKind::Infections => Box::new(hcv::Infection::new(config, source)?),
        EventKind::HIVInfections => Box::new(hiv::Infection::new(source)?),
        EventKind::Screening => Box::new(Screening::new(config, source, InfectionPolicy::HCV)?),
        EventKind::HIVScreening => {
            Box::new(Screening::new(config, source, InfectionPolicy::HIV)?)
        }
        EventKind::Linking => Box::new(Linking::new(config, source, InfectionPolicy::HCV)?),
        EventKind::HIVLinking => Box::new(Linking::new(config, source, InfectionPolicy::HIV)?),
        EventKind::Treatment => Box::new(hcv::Treatment::new(config, source)?),
        EventKind::HIVTreatment => Box::new(hiv::Treatment::new(config, source)?),
        EventKind::VoluntaryRelinking => Box::new(hcv::VoluntaryRelink::new(config)?),
        EventKind::MOUD => Box::new(Moud::new(config, source)?),
        EventKind::Overdose => Box::new(Overdose::new(config, source)?),
        EventKind::Pregnancy => Box::new(Pregnancy::new(config, source)?),
    };
    Ok(event)
}

/// Parses the `simulation.events` list.
///
/// # Errors
/// Returns a `ConfigError` naming the first unknown event.
pub fn configured_event_kinds(config: &dyn ConfigSource) -> Result<Vec<EventKind>, HepceError> {
    config
        .get_vec::<String>("simulation.events")
        .iter()
        .map(|name| {
            EventKind::from_str(name)
                .map_err(|_| HepceError::ConfigError(format!("unknown event `{name}`")))
        })
        .collect()
}

/// Run length and seed read from the `simulation` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Months to run.
    pub duration: i32,
    pub seed: u64,
}

impl SimulationSettings {
    /// # Errors
    /// Returns a `ConfigError` for a negative duration or seed.
    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, HepceError> {
        let duration = config.get_int("simulation.duration");
        if duration < 0 {
            return Err(HepceError::ConfigError(format!(
                "simulation.duration must be non-negative, got {duration}"
            )));
        }
        let seed = config.get_int("simulation.seed");
        let seed = u64::try_from(seed).map_err(|_| {
            HepceError::ConfigError(format!("simulation.seed must be non-negative, got {seed}"))
        })?;
        Ok(SimulationSettings { duration, seed })
    }
}

pub struct Simulation {
    events: Vec<Box<dyn Event>>,
    population: Vec<Person>,
}

impl Simulation {
    #[must_use]
    pub fn new(events: Vec<Box<dyn Event>>, population: Vec<Person>) -> Self {
        Simulation { events, population }
    }

    /// Builds every event listed in `simulation.events`, in order.
    ///
    /// # Errors
    /// Returns a `ConfigError` for an unknown event name, or any event construction error.
    pub fn from_config(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
        population: Vec<Person>,
    ) -> Result<Self, HepceError> {
        let events = configured_event_kinds(config)?
            .into_iter()
            .map(|kind| create_event(kind, config, source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Simulation::new(events, population))
    }

    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.name()).collect()
    }

    #[must_use]
    pub fn population(&self) -> &[Person] {
        &self.population
    }

    #[must_use]
    pub fn into_population(self) -> Vec<Person> {
        self.population
    }

    /// Runs `duration` monthly timesteps.
    ///
    /// # Errors
    /// Stops at and returns the first error raised by an event.
    pub fn run(&mut self, sampler: &mut dyn Sampler, duration: i32) -> Result<(), HepceError> {
        info!(
            "Running {} people through {} events for {duration} months",
            self.population.len(),
            self.events.len()
        );
        for month in 0..duration {
            for person in &mut self.population {
                for event in &self.events {
                    event.execute(person, sampler)?;
                }
            }
            debug!(
                "Finished month {month}, {} alive",
                self.population.iter().filter(|p| p.is_alive()).count()
            );
        }
        Ok(())
    }
}
