use log::trace;

use crate::config::ConfigSource;
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{load_cost_util_table, Event, EventBase};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{CostCategory, CostUtil, UtilityCategory};

/// Non-fatal overdose onset. Whether an overdose kills is decided by the death event.
pub struct Overdose {
    base: EventBase,
    /// (pregnancy, moud, drug_behavior)
    probabilities: StratifiedTable<(i32, i32, i32), f64>,
    /// (drug_behavior)
    impacts: StratifiedTable<i32, CostUtil>,
}

impl Overdose {
    /// # Errors
    /// Returns an error for a negative discount rate, or for an empty table under
    /// `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(Overdose {
            base: EventBase::new(config, CostCategory::Behavior, UtilityCategory::Behavior)?,
            probabilities: load_table(source, "overdose_probabilities", |row| {
                Ok((
                    (
                        row.int("pregnancy")?,
                        row.int("moud")?,
                        row.int("drug_behavior")?,
                    ),
                    row.double("probability")?,
                ))
            })?,
            impacts: load_cost_util_table(source, "overdose_impacts", |row| {
                row.int("drug_behavior")
            })?,
        })
    }
}

impl Event for Overdose {
    fn name(&self) -> &'static str {
        "Overdose"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let key = (
            person.pregnancy_state().code(),
            person.moud().code(),
            person.behavior().code(),
        );
        let probability = self.probabilities.get(&key);
        if sampler.get_decision(&[probability, 1.0 - probability]) != 0 || person.is_overdosing()
        {
            return Ok(());
        }
        trace!("Person {} overdosed", person.id());
        person.toggle_overdose();
        let impact = self.impacts.get(&person.behavior().code());
        self.base.add_cost_and_utility(person, impact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::data::InMemorySource;
    use crate::event::test_support::base_config;
    use crate::numeric::ACC;
    use crate::sampler::ScriptedSampler;
    use crate::types::Behavior;

    fn event() -> Overdose {
        let source = InMemorySource::new()
            .with_csv(
                "overdose_probabilities",
                "pregnancy,moud,drug_behavior,probability\n-1,0,4,0.03\n",
            )
            .with_csv("overdose_impacts", "drug_behavior,cost,utility\n4,5000,0.4\n");
        Overdose::new(&base_config(), &source).unwrap()
    }

    #[test]
    fn index_zero_starts_an_overdose() {
        let event = event();
        let mut person = Person::new(0);
        person.set_behavior(Behavior::Injection);
        let mut sampler = ScriptedSampler::new(&[0]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0][0], 0.03);
        assert_almost_eq!(sampler.requests[0][1], 0.97, ACC);
        assert!(person.is_overdosing());
        assert_eq!(person.num_overdoses(), 1);
        assert_eq!(person.costs().get(CostCategory::Behavior).0, 5000.0);
        assert_eq!(person.utility(UtilityCategory::Behavior), 0.4);
    }

    #[test]
    fn ongoing_overdose_is_not_counted_again() {
        let event = event();
        let mut person = Person::new(0);
        person.set_behavior(Behavior::Injection);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[0]))
            .unwrap();
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[0]))
            .unwrap();
        assert!(person.is_overdosing());
        assert_eq!(person.num_overdoses(), 1);
        assert_eq!(person.cost_totals().0, 5000.0);
    }

    #[test]
    fn complement_draw_does_nothing() {
        let event = event();
        let mut person = Person::new(0);
        person.set_behavior(Behavior::Injection);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[1]))
            .unwrap();
        assert!(!person.is_overdosing());
        assert_eq!(person.cost_totals().0, 0.0);
    }
}
