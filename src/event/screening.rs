//! Antibody and RNA screening, shared by HCV and HIV.
use log::trace;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::policy::InfectionPolicy;
use crate::event::{demographic_key, Event, EventBase};
use crate::numeric::scale_probability;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{InfectionType, LinkageState, LinkageType, UtilityCategory, HCV};

/// Characteristics of one test in one screening program.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TestCharacteristics {
    pub acute_sensitivity: f64,
    pub chronic_sensitivity: f64,
    pub specificity: f64,
    pub cost: f64,
}

impl TestCharacteristics {
    fn load(config: &dyn ConfigSource, section: &str) -> Result<Self, HepceError> {
        Ok(TestCharacteristics {
            acute_sensitivity: config.get_double(&format!("{section}.acute_sensitivity"), true)?,
            chronic_sensitivity: config
                .get_double(&format!("{section}.chronic_sensitivity"), true)?,
            specificity: config.get_double(&format!("{section}.specificity"), true)?,
            cost: config.get_double(&format!("{section}.cost"), true)?,
        })
    }

    /// Probability of a positive result given the true infection stage.
    #[must_use]
    pub fn positive_probability(&self, stage: HCV) -> f64 {
        match stage {
            HCV::Acute => self.acute_sensitivity,
            HCV::Chronic => self.chronic_sensitivity,
            HCV::None => 1.0 - self.specificity,
        }
    }
}

/// The antibody and RNA tests of one screening program.
#[derive(Debug, Clone, Copy, Default)]
struct Program {
    ab: TestCharacteristics,
    rna: TestCharacteristics,
    link_type: LinkageType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScreenProbabilities {
    background: f64,
    intervention: f64,
}

/// Who gets an intervention screen instead of background screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterventionType {
    OneTime,
    Periodic,
    NoIntervention,
}

/// Offers a screen each month, runs the antibody then RNA test and diagnoses on a positive RNA
/// result. People already linked to care for the infection are not screened.
pub struct Screening {
    base: EventBase,
    policy: InfectionPolicy,
    intervention_type: InterventionType,
    period: i32,
    boomer_multiplier: f64,
    background: Program,
    intervention: Program,
    /// (age_years, gender, drug_behavior)
    probabilities: StratifiedTable<(i32, i32, i32), ScreenProbabilities>,
}

impl Screening {
    /// # Errors
    /// Returns an error for negative test characteristics or discount rate, or for an empty
    /// table under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
        policy: InfectionPolicy,
    ) -> Result<Self, HepceError> {
        let section = policy.key("screening");
        let intervention_type = match config
            .get_string(&format!("{section}.intervention_type"))
            .as_str()
        {
            "one-time" => InterventionType::OneTime,
            "periodic" => InterventionType::Periodic,
            _ => InterventionType::NoIntervention,
        };
        let boomer_key = format!("{section}.seropositivity_multiplier_boomer");
        let boomer_multiplier = if config.get_from_config(&boomer_key).is_some() {
            config.get_double(&boomer_key, true)?
        } else {
            1.0
        };
        let program = |kind: &str, link_type| -> Result<Program, HepceError> {
            Ok(Program {
                ab: TestCharacteristics::load(config, &format!("{section}_{kind}_ab"))?,
                rna: TestCharacteristics::load(config, &format!("{section}_{kind}_rna"))?,
                link_type,
            })
        };
        Ok(Screening {
            base: EventBase::new(
                config,
                policy.screening_cost_category(),
                UtilityCategory::Background,
            )?,
            policy,
            intervention_type,
            period: config.get_int(&format!("{section}.period")),
            boomer_multiplier,
            background: program("background", LinkageType::Background)?,
            intervention: program("intervention", LinkageType::Intervention)?,
            probabilities: load_table(
                source,
                &policy.key("screening_and_linkage"),
                |row| {
                    Ok((
                        (
                            row.int("age_years")?,
                            row.int("gender")?,
                            row.int("drug_behavior")?,
                        ),
                        ScreenProbabilities {
                            background: row.double("background_screen_probability")?,
                            intervention: row.double("intervention_screen_probability")?,
                        },
                    ))
                },
            )?,
        })
    }

    fn is_intervention_due(&self, person: &Person) -> bool {
        let it = self.policy.infection_type();
        match self.intervention_type {
            InterventionType::OneTime => person.current_time() == 1,
            InterventionType::Periodic => {
                let last = person.screening_details(it).time_of_last_screening;
                person.current_time() == 1 || person.time_since(last) >= self.period
            }
            InterventionType::NoIntervention => false,
        }
    }

    fn screen_probability(&self, person: &Person, intervention: bool) -> Result<f64, HepceError> {
        let key = demographic_key(person);
        let entry = self.probabilities.get(&key);
        let probability = if intervention {
            entry.intervention
        } else {
            entry.background
        };
        if person.is_boomer() && probability < 1.0 {
            return scale_probability(probability, self.boomer_multiplier);
        }
        Ok(probability)
    }

    /// Runs one test, charging its cost. Returns whether the result was positive.
    fn run_test(
        &self,
        person: &mut Person,
        sampler: &mut dyn Sampler,
        test: &TestCharacteristics,
    ) -> Result<bool, HepceError> {
        let probability = test.positive_probability(self.policy.screening_stage(person));
        let positive = sampler.get_decision(&[probability]) == 0;
        self.base.add_event_cost(person, test.cost, false)?;
        Ok(positive)
    }

    fn record_false_negative(&self, person: &mut Person) {
        let it = self.policy.infection_type();
        if self.policy.is_infected(person) {
            person.add_false_negative(it);
            person.clear_diagnosis(it);
        }
    }

    fn screen(
        &self,
        person: &mut Person,
        sampler: &mut dyn Sampler,
        program: &Program,
    ) -> Result<(), HepceError> {
        let it = self.policy.infection_type();
        person.mark_screened(it);
        let details = person.screening_details(it);
        let eligible_for_ab = program.link_type == LinkageType::Background || !details.identified;
        if eligible_for_ab && !details.ab_positive {
            person.add_ab_screen(it);
            if !self.run_test(person, sampler, &program.ab)? {
                self.record_false_negative(person);
                return Ok(());
            }
            person.set_antibody_positive(it, true);
        }

        person.add_rna_screen(it);
        if self.run_test(person, sampler, &program.rna)? {
            if !person.is_identified(it) {
                person.set_linkage_type(program.link_type, it);
                person.diagnose(it);
                trace!("Person {} identified with {it}", person.id());
            }
        } else {
            self.record_false_negative(person);
        }
        Ok(())
    }
}

impl Event for Screening {
    fn name(&self) -> &'static str {
        match self.policy.infection_type() {
            InfectionType::Hcv => "Screening",
            InfectionType::Hiv => "HIVScreening",
        }
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if person.linkage_state(self.policy.infection_type()) == LinkageState::Linked {
            return Ok(());
        }
        let intervention = self.is_intervention_due(person);
        let probability = self.screen_probability(person, intervention)?;
        if sampler.get_decision(&[probability]) != 0 {
            return Ok(());
        }
        let program = if intervention {
            &self.intervention
        } else {
            &self.background
        };
        self.screen(person, sampler, program)
    }
}
