use log::{debug, warn};

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{demographic_key, Event, EventBase};
use crate::numeric::{probability_to_rate, rate_to_probability};
use crate::person::{Person, MAX_AGE};
use crate::sampler::Sampler;
use crate::types::{CostCategory, DeathReason, FibrosisState, UtilityCategory, HCV, HIV};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BackgroundSmr {
    background_mortality: f64,
    smr: f64,
}

/// Liver-related mortality by fibrosis stage and infection status.
#[derive(Debug, Clone, Copy, Default)]
struct FibrosisMortality {
    f4_infected: f64,
    f4_uninfected: f64,
    decomp_infected: f64,
    decomp_uninfected: f64,
}

impl FibrosisMortality {
    fn probability(&self, person: &Person) -> f64 {
        let infected = person.hcv() != HCV::None;
        match (person.fibrosis_state(), infected) {
            (FibrosisState::F4, true) => self.f4_infected,
            (FibrosisState::F4, false) => self.f4_uninfected,
            (FibrosisState::Decomp, true) => self.decomp_infected,
            (FibrosisState::Decomp, false) => self.decomp_uninfected,
            _ => 0.0,
        }
    }
}

/// Resolves every cause of death in a fixed order: fatal overdose, HIV, old age, then a
/// competing background/liver draw. The first cause that fires ends the check.
pub struct Death {
    fibrosis: FibrosisMortality,
    model_overdose: bool,
    model_hiv: bool,
    /// (age_years, gender, drug_behavior)
    background: StratifiedTable<(i32, i32, i32), BackgroundSmr>,
    /// (moud, drug_behavior)
    overdose_fatality: StratifiedTable<(i32, i32), f64>,
    /// (hiv_status)
    hiv_mortality: StratifiedTable<i32, f64>,
}

impl Death {
    /// # Errors
    /// Returns an error for negative mortality constants or discount rate, or for an empty
    /// required table under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        let base = EventBase::new(config, CostCategory::Background, UtilityCategory::Background)?;
        let fibrosis = FibrosisMortality {
            f4_infected: config.get_double("mortality.f4_infected", true)?,
            f4_uninfected: config.get_double("mortality.f4_uninfected", true)?,
            decomp_infected: config.get_double("mortality.decomp_infected", true)?,
            decomp_uninfected: config.get_double("mortality.decomp_uninfected", true)?,
        };
        let model_overdose = base.is_event_configured("Overdose");
        let model_hiv = base.is_hiv_modeled();

        let overdose_fatality = if model_overdose {
            load_table(source, "overdoses", |row| {
                Ok((
                    (row.int("moud")?, row.int("drug_behavior")?),
                    row.double("fatality_probability")?,
                ))
            })?
        } else {
            StratifiedTable::default()
        };
        let hiv_mortality = if model_hiv {
            load_table(source, "hiv_mortality", |row| {
                Ok((row.int("hiv_status")?, row.double("mortality_probability")?))
            })?
        } else {
            StratifiedTable::default()
        };

        Ok(Death {
            fibrosis,
            model_overdose,
            model_hiv,
            background: Self::load_background(source)?,
            overdose_fatality,
            hiv_mortality,
        })
    }

    /// Joins `background_mortality` (age_years, gender) with `smr` (gender, drug_behavior) on
    /// gender.
    fn load_background(
        source: &dyn StratifiedSource,
    ) -> Result<StratifiedTable<(i32, i32, i32), BackgroundSmr>, HepceError> {
        let mortality = load_table(source, "background_mortality", |row| {
            Ok((
                (row.int("age_years")?, row.int("gender")?),
                row.double("background_mortality")?,
            ))
        })?;
        let smr = load_table(source, "smr", |row| {
            Ok((
                (row.int("gender")?, row.int("drug_behavior")?),
                row.double("smr")?,
            ))
        })?;
        Ok(mortality
            .iter()
            .flat_map(|(&(age, gender), &background_mortality)| {
                smr.iter()
                    .filter(move |((smr_gender, _), _)| *smr_gender == gender)
                    .map(move |(&(_, behavior), &smr)| {
                        (
                            (age, gender, behavior),
                            BackgroundSmr {
                                background_mortality,
                                smr,
                            },
                        )
                    })
            })
            .collect())
    }

    fn die(&self, person: &mut Person, reason: DeathReason) {
        debug!(
            "Person {} died at t={} ({reason})",
            person.id(),
            person.current_time()
        );
        person.die(reason);
    }

    /// Returns true if the person died of an overdose.
    fn fatal_overdose(&self, person: &mut Person, sampler: &mut dyn Sampler) -> bool {
        if !self.model_overdose || !person.is_overdosing() {
            return false;
        }
        if self.overdose_fatality.is_empty() {
            warn!("No fatal overdose probability found");
            person.toggle_overdose();
            return false;
        }
        let key = (person.moud().code(), person.behavior().code());
        let probability = self.overdose_fatality.get(&key);
        if sampler.get_decision(&[probability, 1.0 - probability]) != 0 {
            person.toggle_overdose();
            return false;
        }
        self.die(person, DeathReason::Overdose);
        true
    }

    fn hiv_death(&self, person: &mut Person, sampler: &mut dyn Sampler) -> bool {
        if !self.model_hiv || person.hiv() == HIV::None {
            return false;
        }
        let probability = self.hiv_mortality.get(&person.hiv().code());
        if sampler.get_decision(&[probability]) == 0 {
            self.die(person, DeathReason::Hiv);
            return true;
        }
        false
    }

    /// Background mortality scaled by the SMR in rate space.
    fn background_probability(&self, person: &Person) -> Result<f64, HepceError> {
        let key = demographic_key(person);
        let entry = self.background.get(&key);
        if entry.background_mortality >= 1.0 {
            return Ok(1.0);
        }
        rate_to_probability(probability_to_rate(entry.background_mortality)? * entry.smr)
    }
}

impl Event for Death {
    fn name(&self) -> &'static str {
        "Death"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if self.fatal_overdose(person, sampler) || self.hiv_death(person, sampler) {
            return Ok(());
        }
        if person.age() >= MAX_AGE {
            self.die(person, DeathReason::Age);
            return Ok(());
        }
        let background = self.background_probability(person)?;
        let liver = self.fibrosis.probability(person);
        match sampler.get_decision(&[background, liver, 1.0 - background - liver]) {
            0 => self.die(person, DeathReason::Background),
            1 => self.die(person, DeathReason::Liver),
            _ => {}
        }
        Ok(())
    }
}
