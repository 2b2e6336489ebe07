use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{load_cost_util_table, Event, EventBase};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{CostCategory, CostUtil, FibrosisState, InfectionType, UtilityCategory, HCV};

/// Monthly probability of advancing out of each stage.
#[derive(Debug, Clone, Copy)]
struct StageProbabilities {
    f01: f64,
    f12: f64,
    f23: f64,
    f34: f64,
    f4d: f64,
}

impl StageProbabilities {
    fn from_stage(&self, state: FibrosisState) -> f64 {
        match state {
            FibrosisState::F0 => self.f01,
            FibrosisState::F1 => self.f12,
            FibrosisState::F2 => self.f23,
            FibrosisState::F3 => self.f34,
            FibrosisState::F4 => self.f4d,
            FibrosisState::Decomp | FibrosisState::None => 0.0,
        }
    }
}

/// Advances true fibrosis one stage at a time while HCV is active, and applies the liver cost
/// and utility of the resulting stage.
pub struct FibrosisProgression {
    base: EventBase,
    probabilities: StageProbabilities,
    add_cost_only_if_identified: bool,
    /// (hcv_status, fibrosis_state)
    impacts: StratifiedTable<(i32, i32), CostUtil>,
}

impl FibrosisProgression {
    /// # Errors
    /// Returns an error for negative probabilities or discount rate, or for an empty table
    /// under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(FibrosisProgression {
            base: EventBase::new(config, CostCategory::Liver, UtilityCategory::Liver)?,
            probabilities: StageProbabilities {
                f01: config.get_double("fibrosis.f01", true)?,
                f12: config.get_double("fibrosis.f12", true)?,
                f23: config.get_double("fibrosis.f23", true)?,
                f34: config.get_double("fibrosis.f34", true)?,
                f4d: config.get_double("fibrosis.f4d", true)?,
            },
            add_cost_only_if_identified: config.get_bool("fibrosis.add_cost_only_if_identified"),
            impacts: load_cost_util_table(source, "hcv_impacts", |row| {
                Ok((row.int("hcv_status")?, row.int("fibrosis_state")?))
            })?,
        })
    }

    fn resolve_cost_and_utility(&self, person: &mut Person) -> Result<(), HepceError> {
        let infected = i32::from(person.hcv() != HCV::None);
        let impact = self
            .impacts
            .get(&(infected, person.fibrosis_state().code()));
        self.base.add_event_utility(person, impact.util);
        // Cirrhotic stages present clinically whether or not the infection is known.
        if self.add_cost_only_if_identified
            && !person.is_identified(InfectionType::Hcv)
            && !person.is_cirrhotic()
        {
            return Ok(());
        }
        self.base.add_event_cost(person, impact.cost, false)
    }
}

impl Event for FibrosisProgression {
    fn name(&self) -> &'static str {
        "FibrosisProgression"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let state = person.fibrosis_state();
        if state == FibrosisState::None {
            return Ok(());
        }
        if person.hcv() != HCV::None {
            let p = self.probabilities.from_stage(state);
            if sampler.get_decision(&[p, 1.0 - p]) == 0 && state.next() != state {
                person.update_true_fibrosis(state.next());
            }
        }
        self.resolve_cost_and_utility(person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::InMemorySource;
    use crate::event::test_support::base_config;
    use crate::sampler::ScriptedSampler;

    fn source() -> InMemorySource {
        InMemorySource::new().with_csv(
            "hcv_impacts",
            "hcv_status,fibrosis_state,cost,utility\n\
             1,1,100,0.9\n1,2,200,0.8\n0,2,50,0.95\n1,4,400,0.6\n0,4,300,0.7\n",
        )
    }

    fn config() -> Config {
        base_config()
            .with("fibrosis.f01", 0.1)
            .with("fibrosis.f12", 1.0)
            .with("fibrosis.f23", 0.1)
            .with("fibrosis.f34", 0.1)
            .with("fibrosis.f4d", 0.1)
    }

    fn infected_at(state: FibrosisState) -> Person {
        let mut person = Person::new(0);
        person.infect_hcv();
        person.update_true_fibrosis(state);
        person
    }

    #[test]
    fn progresses_one_stage() {
        let event = FibrosisProgression::new(&config(), &source()).unwrap();
        let mut person = infected_at(FibrosisState::F1);
        let mut sampler = ScriptedSampler::new(&[0]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0], vec![1.0, 0.0]);
        assert_eq!(person.fibrosis_state(), FibrosisState::F2);
        assert_eq!(person.costs().get(CostCategory::Liver).0, 200.0);
        assert_eq!(person.utility(UtilityCategory::Liver), 0.8);
    }

    #[test]
    fn monotonic_through_decomp() {
        let event = FibrosisProgression::new(&config(), &source()).unwrap();
        let mut person = infected_at(FibrosisState::F0);
        let mut seen = vec![person.fibrosis_state()];
        for _ in 0..8 {
            event
                .execute(&mut person, &mut ScriptedSampler::new(&[0]))
                .unwrap();
            seen.push(person.fibrosis_state());
        }
        assert_eq!(
            &seen[..6],
            &[
                FibrosisState::F0,
                FibrosisState::F1,
                FibrosisState::F2,
                FibrosisState::F3,
                FibrosisState::F4,
                FibrosisState::Decomp
            ]
        );
        assert!(seen[5..].iter().all(|s| *s == FibrosisState::Decomp));
    }

    #[test]
    fn cleared_person_keeps_stage_and_pays() {
        let event = FibrosisProgression::new(&config(), &source()).unwrap();
        let mut person = infected_at(FibrosisState::F2);
        person.clear_hcv(false);
        let mut sampler = ScriptedSampler::new(&[0]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(sampler.requests.is_empty());
        assert_eq!(person.fibrosis_state(), FibrosisState::F2);
        assert_eq!(person.costs().get(CostCategory::Liver).0, 50.0);
    }

    #[test]
    fn cost_only_if_identified() {
        let config = config().with("fibrosis.add_cost_only_if_identified", true);
        let event = FibrosisProgression::new(&config, &source()).unwrap();

        let mut person = infected_at(FibrosisState::F1);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[0]))
            .unwrap();
        assert_eq!(person.cost_totals().0, 0.0);
        assert_eq!(person.utility(UtilityCategory::Liver), 0.8);

        person.diagnose(InfectionType::Hcv);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[1]))
            .unwrap();
        assert_eq!(person.cost_totals().0, 200.0);

        let mut cirrhotic = infected_at(FibrosisState::F4);
        cirrhotic.clear_hcv(false);
        event
            .execute(&mut cirrhotic, &mut ScriptedSampler::default())
            .unwrap();
        assert_eq!(cirrhotic.cost_totals().0, 300.0);
    }

    #[test]
    fn never_infected_is_untouched() {
        let event = FibrosisProgression::new(&config(), &source()).unwrap();
        let mut person = Person::new(0);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[0]))
            .unwrap();
        assert_eq!(person.utility(UtilityCategory::Liver), 1.0);
        assert_eq!(person.cost_totals(), (0.0, 0.0));
    }
}
