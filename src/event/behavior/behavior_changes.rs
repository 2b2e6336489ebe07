use log::error;
use strum::EnumCount;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{load_cost_util_table, Event, EventBase};
use crate::numeric::{probability_to_rate, rate_to_probability};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{Behavior, CostCategory, CostUtil, UtilityCategory};

/// Months after quitting during which the first-year relapse rate applies.
const FIRST_YEAR_MONTHS: i32 = 12;

/// Transition probabilities into each behavior, indexed by behavior code.
type Transitions = [f64; Behavior::COUNT];

/// Monthly drug use transitions, with relapse out of former use fading the longer a person has
/// stayed abstinent.
pub struct BehaviorChanges {
    base: EventBase,
    first_year_relapse_rate: f64,
    later_years_relapse_rate: f64,
    /// (age_years, gender, moud, drug_behavior)
    transitions: StratifiedTable<(i32, i32, i32, i32), Transitions>,
    /// (gender, drug_behavior)
    impacts: StratifiedTable<(i32, i32), CostUtil>,
}

impl BehaviorChanges {
    /// # Errors
    /// Returns an error for a negative relapse rate or discount rate, or for an empty table
    /// under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(BehaviorChanges {
            base: EventBase::new(config, CostCategory::Behavior, UtilityCategory::Behavior)?,
            first_year_relapse_rate: config
                .get_double("behavior.first_year_relapse_rate", true)?,
            later_years_relapse_rate: config
                .get_double("behavior.later_years_relapse_rate", true)?,
            transitions: load_table(source, "behavior_transitions", |row| {
                Ok((
                    (
                        row.int("age_years")?,
                        row.int("gender")?,
                        row.int("moud")?,
                        row.int("drug_behavior")?,
                    ),
                    [
                        row.double("never")?,
                        row.double("fni")?,
                        row.double("fi")?,
                        row.double("ni")?,
                        row.double("in")?,
                    ],
                ))
            })?,
            impacts: load_cost_util_table(source, "behavior_impacts", |row| {
                Ok((row.int("gender")?, row.int("drug_behavior")?))
            })?,
        })
    }

    /// Transition probabilities for the person's stratum. An untabulated stratum keeps the
    /// person where they are.
    fn transitions(&self, person: &Person) -> Result<Transitions, HepceError> {
        let current = person.behavior();
        let key = (
            person.age_years(),
            person.sex().code(),
            person.moud().code(),
            current.code(),
        );
        let Some(transitions) = self.transitions.try_get(&key) else {
            let mut stay = [0.0; Behavior::COUNT];
            stay[current as usize] = 1.0;
            return Ok(stay);
        };
        let mut transitions = *transitions;
        let relapse_target = match current {
            Behavior::FormerNoninjection => Behavior::Noninjection,
            Behavior::FormerInjection => Behavior::Injection,
            _ => return Ok(transitions),
        };
        let relapse = transitions[relapse_target as usize];
        if relapse >= 1.0 {
            return Ok(transitions);
        }
        let months_abstinent = person.time_since(person.behavior_details().time_last_active);
        let rate = if months_abstinent < FIRST_YEAR_MONTHS {
            self.first_year_relapse_rate
        } else {
            self.later_years_relapse_rate
        };
        let decay = (-rate * f64::from(months_abstinent)).exp();
        let decayed = rate_to_probability(probability_to_rate(relapse)? * decay)?;
        transitions[relapse_target as usize] = decayed;
        transitions[current as usize] += relapse - decayed;
        Ok(transitions)
    }
}

impl Event for BehaviorChanges {
    fn name(&self) -> &'static str {
        "BehaviorChanges"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let transitions = self.transitions(person)?;
        let decision = sampler.get_decision(&transitions);
        let Some(behavior) = i32::try_from(decision).ok().and_then(Behavior::from_code) else {
            error!("Behavior decision {decision} is out of bounds");
            return Ok(());
        };
        person.set_behavior(behavior);
        let impact = self
            .impacts
            .get(&(person.sex().code(), person.behavior().code()));
        self.base.add_cost_and_utility(person, impact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::config::Config;
    use crate::data::InMemorySource;
    use crate::event::test_support::base_config;
    use crate::numeric::ACC;
    use crate::sampler::ScriptedSampler;

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_csv(
                "behavior_transitions",
                "age_years,gender,moud,drug_behavior,never,fni,fi,ni,in\n\
                 25,0,0,0,0.9,0,0,0.05,0.05\n\
                 25,0,0,2,0,0,0.8,0,0.2\n\
                 25,0,0,4,0,0,0.1,0,0.9\n",
            )
            .with_csv(
                "behavior_impacts",
                "gender,drug_behavior,cost,utility\n0,4,300,0.6\n0,2,50,0.9\n",
            )
    }

    fn config() -> Config {
        base_config()
            .with("behavior.first_year_relapse_rate", 0.1)
            .with("behavior.later_years_relapse_rate", 0.01)
    }

    fn person() -> Person {
        let mut person = Person::new(0);
        person.set_age(300);
        person
    }

    #[test]
    fn start_injecting() {
        let event = BehaviorChanges::new(&config(), &source()).unwrap();
        let mut person = person();
        let mut sampler = ScriptedSampler::new(&[4]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0], vec![0.9, 0.0, 0.0, 0.05, 0.05]);
        assert_eq!(person.behavior(), Behavior::Injection);
        assert_eq!(person.behavior_details().time_last_active, 0);
        assert_eq!(person.costs().get(CostCategory::Behavior).0, 300.0);
        assert_eq!(person.utility(UtilityCategory::Behavior), 0.6);
    }

    #[test]
    fn relapse_decays_with_abstinence() {
        let event = BehaviorChanges::new(&config(), &source()).unwrap();
        let mut person = person();
        person.set_behavior(Behavior::Injection);
        person.set_behavior(Behavior::FormerInjection);
        for _ in 0..6 {
            person.update_timers();
        }
        let mut sampler = ScriptedSampler::new(&[2]);
        event.execute(&mut person, &mut sampler).unwrap();
        let decay = (-0.1_f64 * 6.0).exp();
        let relapse = 1.0 - 0.8_f64.powf(decay);
        let probabilities = &sampler.requests[0];
        assert_almost_eq!(probabilities[4], relapse, ACC);
        assert_almost_eq!(probabilities[2], 1.0 - relapse, ACC);
        assert_eq!(person.behavior(), Behavior::FormerInjection);

        for _ in 0..6 {
            person.update_timers();
        }
        let mut sampler = ScriptedSampler::new(&[2]);
        event.execute(&mut person, &mut sampler).unwrap();
        let decay = (-0.01_f64 * 12.0).exp();
        assert_almost_eq!(sampler.requests[0][4], 1.0 - 0.8_f64.powf(decay), ACC);
    }

    #[test]
    fn untabulated_stratum_stays_put() {
        let event = BehaviorChanges::new(&config(), &source()).unwrap();
        let mut person = person();
        person.set_behavior(Behavior::Noninjection);
        let mut sampler = ScriptedSampler::new(&[3]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0], vec![0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(person.behavior(), Behavior::Noninjection);
    }

    #[test]
    fn out_of_range_decision_changes_nothing() {
        let event = BehaviorChanges::new(&config(), &source()).unwrap();
        let mut person = person();
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[5]))
            .unwrap();
        assert_eq!(person.behavior(), Behavior::Never);
        assert_eq!(person.cost_totals().0, 0.0);
    }
}
