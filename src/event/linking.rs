//! Linkage to care after a diagnosis, shared by HCV and HIV.
use log::trace;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::policy::InfectionPolicy;
use crate::event::{Event, EventBase};
use crate::numeric::{probability_to_rate, rate_to_probability};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{InfectionType, LinkageState, LinkageType, UtilityCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LinkProbabilities {
    background: f64,
    intervention: f64,
}

/// Adjustment applied to the link probability based on how recently the person was screened.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scaling {
    /// Rate scaled by `e^-t`.
    Exponential,
    /// Rate scaled by a constant when screened at most `cutoff` months ago.
    Multiplier { multiplier: f64, cutoff: i32 },
    None,
}

impl Scaling {
    fn apply(self, probability: f64, months_since_screen: i32) -> Result<f64, HepceError> {
        if probability >= 1.0 {
            return Ok(probability);
        }
        let factor = match self {
            Scaling::Exponential => (-f64::from(months_since_screen)).exp(),
            Scaling::Multiplier { multiplier, cutoff } if months_since_screen <= cutoff => {
                multiplier
            }
            Scaling::Multiplier { .. } | Scaling::None => return Ok(probability),
        };
        rate_to_probability(probability_to_rate(probability)? * factor)
    }
}

/// Links identified people to care. A diagnosis that turns out to be false is cleared at the
/// first linking visit instead.
pub struct Linking {
    base: EventBase,
    policy: InfectionPolicy,
    model_pregnancy: bool,
    intervention_cost: f64,
    false_positive_test_cost: f64,
    scaling: Scaling,
    /// (age_years, gender, drug_behavior, pregnancy or -1)
    probabilities: StratifiedTable<(i32, i32, i32, i32), LinkProbabilities>,
}

impl Linking {
    /// # Errors
    /// Returns an error for negative costs or discount rate, or for an empty table under
    /// `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
        policy: InfectionPolicy,
    ) -> Result<Self, HepceError> {
        let base = EventBase::new(
            config,
            policy.linking_cost_category(),
            UtilityCategory::Background,
        )?;
        let section = policy.key("linking");
        let scaling = match config.get_string(&format!("{section}.scaling_type")).as_str() {
            "exponential" => Scaling::Exponential,
            "multiplier" => Scaling::Multiplier {
                multiplier: config
                    .get_double(&format!("{section}.recent_screen_multiplier"), true)?,
                cutoff: config.get_int(&format!("{section}.recent_screen_cutoff")),
            },
            _ => Scaling::None,
        };
        let model_pregnancy = base.is_event_configured("Pregnancy");
        let probabilities = load_table(source, &policy.key("screening_and_linkage"), |row| {
            let pregnancy = if model_pregnancy {
                row.int("pregnancy")?
            } else {
                -1
            };
            Ok((
                (
                    row.int("age_years")?,
                    row.int("gender")?,
                    row.int("drug_behavior")?,
                    pregnancy,
                ),
                LinkProbabilities {
                    background: row.double("background_link_probability")?,
                    intervention: row.double("intervention_link_probability")?,
                },
            ))
        })?;
        Ok(Linking {
            intervention_cost: config.get_double(&format!("{section}.intervention_cost"), true)?,
            false_positive_test_cost: config
                .get_double(&format!("{section}.false_positive_test_cost"), true)?,
            base,
            policy,
            model_pregnancy,
            scaling,
            probabilities,
        })
    }

    fn link_probability(&self, person: &Person, link_type: LinkageType) -> Result<f64, HepceError> {
        let pregnancy = if self.model_pregnancy {
            person.pregnancy_state().code()
        } else {
            -1
        };
        let key = (
            person.age_years(),
            person.sex().code(),
            person.behavior().code(),
            pregnancy,
        );
        let entry = self.probabilities.get(&key);
        let probability = if link_type == LinkageType::Intervention {
            entry.intervention
        } else {
            entry.background
        };
        let it = self.policy.infection_type();
        let last_screen = person.screening_details(it).time_of_last_screening;
        self.scaling.apply(probability, person.time_since(last_screen))
    }
}

impl Event for Linking {
    fn name(&self) -> &'static str {
        match self.policy.infection_type() {
            InfectionType::Hcv => "Linking",
            InfectionType::Hiv => "HIVLinking",
        }
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let it = self.policy.infection_type();
        if person.linkage_state(it) == LinkageState::Linked || !person.is_identified(it) {
            return Ok(());
        }
        if self.policy.is_false_positive(person) {
            trace!("Person {} has a false positive {it} diagnosis", person.id());
            person.clear_diagnosis(it);
            return self
                .base
                .add_event_cost(person, self.false_positive_test_cost, false);
        }

        let link_type = person.linkage_details(it).link_type;
        let probability = self.link_probability(person, link_type)?;
        if sampler.get_decision(&[probability]) != 0 {
            return Ok(());
        }
        person.link(link_type, it);
        if link_type == LinkageType::Intervention {
            self.base
                .add_event_cost(person, self.intervention_cost, false)?;
        }
        Ok(())
    }
}
