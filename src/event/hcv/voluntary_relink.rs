use crate::config::{ConfigSource, ConfigSourceExt};
use crate::error::HepceError;
use crate::event::{Event, EventBase};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{CostCategory, InfectionType, LinkageState, LinkageType, UtilityCategory, HCV};

const IT: InfectionType = InfectionType::Hcv;

/// People who recently dropped out of HCV care may return on their own, paying for a fresh RNA
/// test on the way back.
pub struct VoluntaryRelink {
    base: EventBase,
    probability: f64,
    duration: i32,
    rna_cost: f64,
}

impl VoluntaryRelink {
    /// # Errors
    /// Returns an error for a negative probability, cost or discount rate.
    pub fn new(config: &dyn ConfigSource) -> Result<Self, HepceError> {
        Ok(VoluntaryRelink {
            base: EventBase::new(config, CostCategory::Screening, UtilityCategory::Background)?,
            probability: config.get_double("linking.voluntary_relinkage_probability", true)?,
            duration: config.get_int("linking.voluntary_relink_duration"),
            rna_cost: config.get_double("screening_background_rna.cost", true)?,
        })
    }
}

impl Event for VoluntaryRelink {
    fn name(&self) -> &'static str {
        "VoluntaryRelinking"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let linkage = person.linkage_details(IT);
        if linkage.link_state != LinkageState::Unlinked
            || person.time_since(linkage.time_link_change) >= self.duration
            || person.hcv() == HCV::None
        {
            return Ok(());
        }
        if sampler.get_decision(&[self.probability]) != 0 {
            return Ok(());
        }
        person.add_rna_screen(IT);
        self.base.add_event_cost(person, self.rna_cost, false)?;
        person.link(LinkageType::Background, IT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_support::base_config;
    use crate::sampler::ScriptedSampler;

    fn event() -> VoluntaryRelink {
        let config = base_config()
            .with("linking.voluntary_relinkage_probability", 0.3)
            .with("linking.voluntary_relink_duration", 3)
            .with("screening_background_rna.cost", 100);
        VoluntaryRelink::new(&config).unwrap()
    }

    fn dropped_out() -> Person {
        let mut person = Person::new(0);
        person.infect_hcv();
        person.link(LinkageType::Intervention, IT);
        person.unlink(IT);
        person
    }

    #[test]
    fn relinks_as_background() {
        let mut person = dropped_out();
        let mut sampler = ScriptedSampler::new(&[0]);
        event().execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0], vec![0.3]);
        let linkage = person.linkage_details(IT);
        assert_eq!(linkage.link_state, LinkageState::Linked);
        assert_eq!(linkage.link_type, LinkageType::Background);
        assert_eq!(linkage.link_count, 2);
        assert_eq!(person.screening_details(IT).num_rna_tests, 1);
        assert_eq!(person.costs().get(CostCategory::Screening).0, 100.0);
    }

    #[test]
    fn window_closes() {
        let mut person = dropped_out();
        for _ in 0..3 {
            person.update_timers();
        }
        let mut sampler = ScriptedSampler::new(&[0]);
        event().execute(&mut person, &mut sampler).unwrap();
        assert!(sampler.requests.is_empty());
        assert_eq!(person.linkage_state(IT), LinkageState::Unlinked);
    }

    #[test]
    fn cured_people_stay_out() {
        let mut person = dropped_out();
        person.clear_hcv(false);
        let mut sampler = ScriptedSampler::new(&[0]);
        event().execute(&mut person, &mut sampler).unwrap();
        assert!(sampler.requests.is_empty());
    }
}
