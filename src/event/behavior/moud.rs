use crate::config::ConfigSource;
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{load_cost_util_table, Event, EventBase};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{Behavior, CostCategory, CostUtil, UtilityCategory, MOUD};

/// Probabilities of moving to {none, current, post}.
type Transitions = [f64; 3];

/// Used when a stratum is missing from `moud_transitions`.
const NO_TRANSITION: Transitions = [1.0, 0.0, 0.0];

/// Medication for opioid use disorder. People who have ever used may start treatment, and
/// those on treatment may stop; stopping passes through a one-month `Post` state.
pub struct Moud {
    base: EventBase,
    /// (age_years, current_moud, current_duration, pregnancy)
    transitions: StratifiedTable<(i32, i32, i32, i32), Transitions>,
    /// (moud, pregnancy)
    costs: StratifiedTable<(i32, i32), CostUtil>,
}

impl Moud {
    /// # Errors
    /// Returns an error for a negative discount rate, or for an empty table under
    /// `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(Moud {
            base: EventBase::new(config, CostCategory::Behavior, UtilityCategory::Behavior)?,
            transitions: load_table(source, "moud_transitions", |row| {
                Ok((
                    (
                        row.int("age_years")?,
                        row.int("current_moud")?,
                        row.int("current_duration")?,
                        row.int("pregnancy")?,
                    ),
                    [
                        row.double("none")?,
                        row.double("current")?,
                        row.double("post")?,
                    ],
                ))
            })?,
            costs: load_cost_util_table(source, "moud_costs", |row| {
                Ok((row.int("moud")?, row.int("pregnancy")?))
            })?,
        })
    }

    fn accrue(&self, person: &mut Person) -> Result<(), HepceError> {
        let key = (person.moud().code(), person.pregnancy_state().code());
        self.base.add_cost_and_utility(person, self.costs.get(&key))
    }
}

impl Event for Moud {
    fn name(&self) -> &'static str {
        "MOUD"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if person.behavior() == Behavior::Never {
            return Ok(());
        }
        let current = person.moud();
        if current == MOUD::Post {
            person.transition_moud(MOUD::None);
            return self.accrue(person);
        }

        let key = (
            person.age_years(),
            current.code(),
            person.moud_details().current_state_concurrent_months,
            person.pregnancy_state().code(),
        );
        let transitions = self
            .transitions
            .try_get(&key)
            .copied()
            .unwrap_or(NO_TRANSITION);
        match (current, sampler.get_decision(&transitions)) {
            (MOUD::Current, 2) => person.transition_moud(MOUD::Post),
            (MOUD::None, 1) => person.transition_moud(MOUD::Current),
            _ => {}
        }
        self.accrue(person)
    }
}
