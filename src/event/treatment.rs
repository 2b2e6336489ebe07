//! The engagement and eligibility rules shared by HCV and HIV treatment.
//!
//! [`TreatmentCore`] runs a treatment visit up to the point where the course-specific parts take
//! over: the linkage guard, loss to follow-up, the visit charge and initiation. It also owns the
//! toxicity and withdrawal draws, which differ between infections only in their probabilities.
use log::trace;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_optional_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::policy::InfectionPolicy;
use crate::event::EventBase;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{Behavior, FibrosisState, LinkageState, PregnancyState};

/// Fixed treatment parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreatmentSettings {
    /// Maximum number of starts. Negative means unlimited.
    pub treatment_limit: i32,
    pub ltfu_probability: f64,
    pub treatment_cost: f64,
    pub salvage_cost: f64,
    pub treatment_utility: f64,
    pub treatment_initiation: f64,
    pub tox_cost: f64,
    pub tox_utility: f64,
}

impl TreatmentSettings {
    fn load(config: &dyn ConfigSource) -> Result<Self, HepceError> {
        Ok(TreatmentSettings {
            treatment_limit: config.get_int("treatment.treatment_limit"),
            ltfu_probability: config.get_double("treatment.ltfu_probability", true)?,
            treatment_cost: config.get_double("treatment.treatment_cost", true)?,
            salvage_cost: config.get_double("treatment.salvage_cost", true)?,
            treatment_utility: config.get_double("treatment.treatment_utility", true)?,
            treatment_initiation: config.get_double("treatment.treatment_initiation", true)?,
            tox_cost: config.get_double("treatment.tox_cost", true)?,
            tox_utility: config.get_double("treatment.tox_utility", true)?,
        })
    }
}

/// States and waiting times that rule out starting a course.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eligibility {
    pub ineligible_behaviors: Vec<Behavior>,
    pub ineligible_fibrosis_stages: Vec<FibrosisState>,
    pub ineligible_pregnancy_states: Vec<PregnancyState>,
    pub ineligible_time_since_linked: i32,
    pub ineligible_time_former_threshold: i32,
}

impl Eligibility {
    fn load(config: &dyn ConfigSource) -> Self {
        Eligibility {
            ineligible_behaviors: config.get_vec("eligibility.ineligible_drug_use"),
            ineligible_fibrosis_stages: config.get_vec("eligibility.ineligible_fibrosis_stages"),
            ineligible_pregnancy_states: config
                .get_vec("eligibility.ineligible_pregnancy_states"),
            ineligible_time_since_linked: config
                .get_int("eligibility.ineligible_time_since_linked"),
            ineligible_time_former_threshold: config
                .get_int("eligibility.ineligible_time_former_threshold"),
        }
    }
}

pub struct TreatmentCore {
    base: EventBase,
    policy: InfectionPolicy,
    settings: TreatmentSettings,
    eligibility: Eligibility,
    /// (pregnancy) → probability. Falls back to `ltfu_probability` when empty.
    lost_to_follow_up: StratifiedTable<i32, f64>,
}

impl TreatmentCore {
    /// Reads `treatment.*` and `eligibility.*`. For HIV, keys under `hiv_treatment.*` and
    /// `hiv_eligibility.*` take precedence.
    ///
    /// # Errors
    /// Returns an error for a negative cost, probability, utility or discount rate.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
        policy: InfectionPolicy,
    ) -> Result<Self, HepceError> {
        let config = policy.with_fallback(config);
        let (cost_category, utility_category) = policy.treatment_categories();
        let lost_to_follow_up = load_optional_table(source, "lost_to_follow_up", |row| {
            Ok((row.int("pregnancy")?, row.double("probability")?))
        });
        Ok(TreatmentCore {
            base: EventBase::new(&config, cost_category, utility_category)?,
            policy,
            settings: TreatmentSettings::load(&config)?,
            eligibility: Eligibility::load(&config),
            lost_to_follow_up,
        })
    }

    #[must_use]
    pub fn base(&self) -> &EventBase {
        &self.base
    }

    #[must_use]
    pub fn settings(&self) -> &TreatmentSettings {
        &self.settings
    }

    /// Whether a linked person may start a new course now.
    #[must_use]
    pub fn is_eligible(&self, person: &Person) -> bool {
        let it = self.policy.infection_type();
        let treatment = person.treatment_details(it);
        let limit = self.settings.treatment_limit;
        let under_limit = limit < 0 || treatment.num_starts < limit;
        if !under_limit || treatment.initiated_treatment {
            return false;
        }

        let rules = &self.eligibility;
        if rules.ineligible_fibrosis_stages.contains(&person.fibrosis_state())
            || rules.ineligible_behaviors.contains(&person.behavior())
        {
            return false;
        }
        let pregnancy = person.pregnancy_state();
        if pregnancy != PregnancyState::Na && rules.ineligible_pregnancy_states.contains(&pregnancy)
        {
            return false;
        }
        let last_active = person.behavior_details().time_last_active;
        if last_active != -1
            && person.time_since(last_active) <= rules.ineligible_time_former_threshold
        {
            return false;
        }
        let link_change = person.linkage_details(it).time_link_change;
        person.time_since(link_change) > rules.ineligible_time_since_linked
    }

    fn ltfu_probability(&self, person: &Person) -> f64 {
        if self.lost_to_follow_up.is_empty() {
            return self.settings.ltfu_probability;
        }
        self.lost_to_follow_up
            .get(&person.pregnancy_state().code())
    }

    /// Ends treatment and linkage, and restores the category utility to `reset_utility`.
    pub fn quit_engagement(&self, person: &mut Person, reset_utility: Option<f64>) {
        let it = self.policy.infection_type();
        person.end_treatment(it);
        person.unlink(it);
        if let Some(utility) = reset_utility {
            self.base.add_event_utility(person, utility);
        }
    }

    /// The common opening of every treatment visit. Returns `true` when the person is on a
    /// course afterwards, either newly started or continuing.
    ///
    /// # Errors
    /// Propagates a `DomainError` from discounting.
    pub fn begin_visit(
        &self,
        person: &mut Person,
        sampler: &mut dyn Sampler,
        visit_cost: f64,
        reset_utility: Option<f64>,
    ) -> Result<bool, HepceError> {
        let it = self.policy.infection_type();
        if person.linkage_state(it) != LinkageState::Linked {
            return Ok(false);
        }
        let initiated = person.treatment_details(it).initiated_treatment;
        if !initiated && sampler.get_decision(&[self.ltfu_probability(person)]) == 0 {
            trace!("Person {} lost to follow-up for {it}", person.id());
            self.quit_engagement(person, reset_utility);
            return Ok(false);
        }
        self.base.add_event_cost(person, visit_cost, false)?;
        if initiated {
            return Ok(true);
        }
        if self.is_eligible(person)
            && sampler.get_decision(&[self.settings.treatment_initiation]) == 0
        {
            person.initiate_treatment(it);
            trace!("Person {} initiated {it} treatment", person.id());
            return Ok(true);
        }
        Ok(false)
    }

    /// Charges the course cost and applies the on-treatment utility.
    ///
    /// # Errors
    /// Propagates a `DomainError` from discounting.
    pub fn charge_course(
        &self,
        person: &mut Person,
        cost: f64,
        utility: f64,
    ) -> Result<(), HepceError> {
        self.base.add_event_cost(person, cost, false)?;
        self.base.add_event_utility(person, utility);
        Ok(())
    }

    /// Draws `{probability}`. On index 0 the person has a toxic reaction, paying the toxicity
    /// cost and taking the toxicity utility.
    ///
    /// # Errors
    /// Propagates a `DomainError` from discounting.
    pub fn check_toxicity(
        &self,
        person: &mut Person,
        sampler: &mut dyn Sampler,
        probability: f64,
    ) -> Result<(), HepceError> {
        if sampler.get_decision(&[probability]) != 0 {
            return Ok(());
        }
        person.add_toxic_reaction(self.policy.infection_type());
        self.base.add_event_cost(person, self.settings.tox_cost, false)?;
        self.base.add_event_utility(person, self.settings.tox_utility);
        Ok(())
    }

    /// Draws `{probability}`. On index 0 the withdrawal is recorded and `true` is returned; the
    /// caller decides how engagement ends.
    pub fn withdraws(
        &self,
        person: &mut Person,
        sampler: &mut dyn Sampler,
        probability: f64,
    ) -> bool {
        if sampler.get_decision(&[probability]) != 0 {
            return false;
        }
        person.add_withdrawal(self.policy.infection_type());
        true
    }

    /// Months since the current course started.
    #[must_use]
    pub fn months_on_treatment(&self, person: &Person) -> i32 {
        let started = person
            .treatment_details(self.policy.infection_type())
            .time_of_treatment_initiation;
        person.time_since(started)
    }
}
