use log::trace;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::Event;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{Child, PregnancyState, Sex, HCV};

/// Ages, in months, at which a person who is neither pregnant nor postpartum may conceive.
const FERTILE_AGES: std::ops::RangeInclusive<i32> = 180..=540;
const GESTATION_MONTHS: i32 = 9;
const RESTRICTED_POSTPARTUM_MONTHS: i32 = 3;
const POSTPARTUM_YEAR_MONTHS: i32 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PregnancyProbabilities {
    stillbirth: f64,
    pregnancy: f64,
}

/// Conception, delivery and the two postpartum years, including vertical HCV transmission to
/// infants of chronically infected mothers.
pub struct Pregnancy {
    multiple_delivery_probability: f64,
    infant_hcv_tested_probability: f64,
    vertical_hcv_transition_probability: f64,
    /// (age_years)
    probabilities: StratifiedTable<i32, PregnancyProbabilities>,
}

impl Pregnancy {
    /// # Errors
    /// Returns an error for a negative probability, or for an empty table under
    /// `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(Pregnancy {
            multiple_delivery_probability: config
                .get_double("pregnancy.multiple_delivery_probability", true)?,
            infant_hcv_tested_probability: config
                .get_double("pregnancy.infant_hcv_tested_probability", true)?,
            vertical_hcv_transition_probability: config
                .get_double("pregnancy.vertical_hcv_transition_probability", true)?,
            probabilities: load_table(source, "pregnancy", |row| {
                Ok((
                    row.int("age_years")?,
                    PregnancyProbabilities {
                        stillbirth: row.double("stillbirth")?,
                        pregnancy: row.double("pregnancy_probability")?,
                    },
                ))
            })?,
        })
    }

    /// Draws `{p, 1 - p}` and reports whether index 0 came up.
    fn occurs(sampler: &mut dyn Sampler, probability: f64) -> bool {
        sampler.get_decision(&[probability, 1.0 - probability]) == 0
    }

    fn progress_postpartum(person: &mut Person, state: PregnancyState) {
        let months = person.time_since(person.pregnancy_details().time_of_pregnancy_change);
        match state {
            PregnancyState::RestrictedPostpartum => {
                person.set_pregnancy_state(PregnancyState::YearOnePostpartum);
            }
            PregnancyState::YearOnePostpartum if months >= POSTPARTUM_YEAR_MONTHS => {
                person.set_pregnancy_state(PregnancyState::YearTwoPostpartum);
            }
            PregnancyState::YearTwoPostpartum if months >= POSTPARTUM_YEAR_MONTHS => {
                person.end_postpartum();
            }
            _ => {}
        }
    }

    fn deliver(&self, person: &mut Person, sampler: &mut dyn Sampler) {
        let probabilities = self.probabilities.get(&person.age_years());
        if Self::occurs(sampler, probabilities.stillbirth) {
            trace!("Person {} had a stillbirth", person.id());
            person.stillbirth();
            return;
        }
        let children = if Self::occurs(sampler, self.multiple_delivery_probability) {
            2
        } else {
            1
        };
        for _ in 0..children {
            let mut child = Child {
                hcv: HCV::None,
                tested: false,
            };
            if person.hcv() == HCV::Chronic {
                child.tested = Self::occurs(sampler, self.infant_hcv_tested_probability);
                person.add_infant_exposure();
                if Self::occurs(sampler, self.vertical_hcv_transition_probability) {
                    child.hcv = HCV::Chronic;
                }
            }
            person.birth(child);
        }
    }
}

impl Event for Pregnancy {
    fn name(&self) -> &'static str {
        "Pregnancy"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if person.sex() == Sex::Male {
            return Ok(());
        }
        let state = person.pregnancy_state();
        let months_in_state =
            person.time_since(person.pregnancy_details().time_of_pregnancy_change);
        if state == PregnancyState::RestrictedPostpartum
            && months_in_state < RESTRICTED_POSTPARTUM_MONTHS
        {
            return Ok(());
        }
        if state.is_postpartum() {
            Self::progress_postpartum(person, state);
            return Ok(());
        }
        if state == PregnancyState::Pregnant {
            if months_in_state >= GESTATION_MONTHS {
                self.deliver(person, sampler);
            }
            return Ok(());
        }
        if !FERTILE_AGES.contains(&person.age()) {
            return Ok(());
        }

        let probability = self.probabilities.get(&person.age_years()).pregnancy;
        if sampler.get_decision(&[1.0 - probability, probability]) == 1 {
            person.impregnate();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::InMemorySource;
    use crate::sampler::ScriptedSampler;

    fn event() -> Pregnancy {
        let source = InMemorySource::new().with_csv(
            "pregnancy",
            "age_years,stillbirth,pregnancy_probability\n25,0.02,0.01\n",
        );
        let config = Config::new()
            .with("pregnancy.multiple_delivery_probability", 0.03)
            .with("pregnancy.infant_hcv_tested_probability", 0.5)
            .with("pregnancy.vertical_hcv_transition_probability", 0.06);
        Pregnancy::new(&config, &source).unwrap()
    }

    fn woman() -> Person {
        let mut person = Person::new(0);
        person.set_sex(Sex::Female);
        person.set_age(300);
        person.set_pregnancy_state(PregnancyState::None);
        person
    }

    fn advance(person: &mut Person, months: i32) {
        for _ in 0..months {
            person.update_timers();
        }
    }

    #[test]
    fn conception_uses_second_index() {
        let event = event();
        let mut person = woman();
        let mut sampler = ScriptedSampler::new(&[1]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0][1], 0.01);
        assert_eq!(person.pregnancy_state(), PregnancyState::Pregnant);
        assert_eq!(person.pregnancy_details().count, 1);
    }

    #[test]
    fn full_term_twins_to_chronic_mother() {
        let event = event();
        let mut person = woman();
        person.infect_hcv();
        person.set_hcv(HCV::Chronic);
        person.impregnate();
        advance(&mut person, 8);
        let mut sampler = ScriptedSampler::default();
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(sampler.requests.is_empty());

        advance(&mut person, 1);
        // live birth, twins, then (tested, transmitted) per child
        let mut sampler = ScriptedSampler::new(&[1, 0, 0, 0, 1, 1]);
        event.execute(&mut person, &mut sampler).unwrap();
        let details = person.pregnancy_details();
        assert_eq!(details.num_infants, 2);
        assert_eq!(details.num_infant_hcv_exposures, 2);
        assert_eq!(details.num_infant_hcv_infections, 1);
        assert_eq!(details.num_infant_hcv_tests, 1);
        assert_eq!(
            details.children,
            vec![
                Child {
                    hcv: HCV::Chronic,
                    tested: true
                },
                Child {
                    hcv: HCV::None,
                    tested: false
                }
            ]
        );
        assert_eq!(
            person.pregnancy_state(),
            PregnancyState::RestrictedPostpartum
        );
    }

    #[test]
    fn stillbirth() {
        let event = event();
        let mut person = woman();
        person.impregnate();
        advance(&mut person, 9);
        let mut sampler = ScriptedSampler::new(&[0]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0][0], 0.02);
        assert_eq!(person.pregnancy_details().num_miscarriages, 1);
        assert_eq!(person.pregnancy_details().num_infants, 0);
        assert_eq!(
            person.pregnancy_state(),
            PregnancyState::RestrictedPostpartum
        );
    }

    #[test]
    fn postpartum_progression() {
        let event = event();
        let mut person = woman();
        person.stillbirth();
        let mut sampler = ScriptedSampler::new(&[1; 8]);
        let mut states = Vec::new();
        for _ in 0..28 {
            person.update_timers();
            event.execute(&mut person, &mut sampler).unwrap();
            states.push(person.pregnancy_state());
        }
        assert_eq!(states[1], PregnancyState::RestrictedPostpartum);
        assert_eq!(states[2], PregnancyState::YearOnePostpartum);
        assert_eq!(states[13], PregnancyState::YearOnePostpartum);
        assert_eq!(states[14], PregnancyState::YearTwoPostpartum);
        assert_eq!(states[26], PregnancyState::None);
        // The month postpartum ends does not also risk conception.
        assert_eq!(sampler.requests.len(), 1);
        assert_eq!(states[27], PregnancyState::Pregnant);
    }

    #[test]
    fn men_and_older_women_are_skipped() {
        let event = event();
        let mut sampler = ScriptedSampler::new(&[1]);
        let mut man = Person::new(0);
        man.set_age(300);
        event.execute(&mut man, &mut sampler).unwrap();

        let mut older = woman();
        older.set_age(541);
        event.execute(&mut older, &mut sampler).unwrap();
        assert!(sampler.requests.is_empty());
    }
}
