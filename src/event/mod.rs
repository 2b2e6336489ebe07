//! Events: the per-person, per-timestep units of the simulation.
//!
//! Every event owns the tables and constants it needs, loaded once at construction, and is
//! immutable afterwards. [`Event::execute`] skips people who are no longer alive; everything
//! else is up to the event's [`Event::do_event`].
use log::trace;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{Row, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::numeric::discount;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{CostCategory, CostUtil, UtilityCategory};

pub mod aging;
pub mod behavior;
pub mod death;
pub mod fibrosis;
pub mod hcv;
pub mod hiv;
pub mod linking;
pub mod policy;
pub mod screening;
pub mod treatment;

pub trait Event {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Applies one month of this event to `person`. Dead people are left untouched.
    ///
    /// # Errors
    /// Propagates numeric domain errors; missing data never produces an error.
    fn execute(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if !person.is_alive() {
            return Ok(());
        }
        trace!(
            "{} for person {} at t={}",
            self.name(),
            person.id(),
            person.current_time()
        );
        self.do_event(person, sampler)
    }

    /// The event body, called only for living people.
    ///
    /// # Errors
    /// Propagates numeric domain errors.
    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError>;
}

/// Discounting and category bookkeeping shared by all events.
#[derive(Debug, Clone)]
pub struct EventBase {
    discount_rate: f64,
    cost_category: CostCategory,
    utility_category: UtilityCategory,
    configured_events: Vec<String>,
}

impl EventBase {
    /// # Errors
    /// Returns a `ConfigError` if `cost.discounting_rate` is negative.
    pub fn new(
        config: &dyn ConfigSource,
        cost_category: CostCategory,
        utility_category: UtilityCategory,
    ) -> Result<Self, HepceError> {
        Ok(EventBase {
            discount_rate: config.get_double("cost.discounting_rate", true)?,
            cost_category,
            utility_category,
            configured_events: config
                .get_vec::<String>("simulation.events")
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        })
    }

    #[must_use]
    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    #[must_use]
    pub fn cost_category(&self) -> CostCategory {
        self.cost_category
    }

    #[must_use]
    pub fn utility_category(&self) -> UtilityCategory {
        self.utility_category
    }

    /// Whether an event with this name appears in `simulation.events`, ignoring case.
    #[must_use]
    pub fn is_event_configured(&self, name: &str) -> bool {
        self.configured_events
            .iter()
            .any(|e| e.eq_ignore_ascii_case(name))
    }

    /// Whether any HIV-axis event is configured.
    #[must_use]
    pub fn is_hiv_modeled(&self) -> bool {
        self.configured_events.iter().any(|e| e.starts_with("hiv"))
    }

    /// Adds `amount` to the event's cost category along with its value discounted to the
    /// person's current timestep. `annual` divides the discount rate by 12 first.
    ///
    /// # Errors
    /// Propagates a `DomainError` from discounting.
    pub fn add_event_cost(
        &self,
        person: &mut Person,
        amount: f64,
        annual: bool,
    ) -> Result<(), HepceError> {
        let discounted = discount(amount, self.discount_rate, person.current_time(), annual)?;
        person.add_cost(amount, discounted, self.cost_category);
        Ok(())
    }

    /// Replaces the person's utility for the event's category.
    pub fn add_event_utility(&self, person: &mut Person, value: f64) {
        person.set_utility(value, self.utility_category);
    }

    /// Adds the cost and sets the utility of an impact record.
    ///
    /// # Errors
    /// Propagates a `DomainError` from discounting.
    pub fn add_cost_and_utility(
        &self,
        person: &mut Person,
        impact: CostUtil,
    ) -> Result<(), HepceError> {
        self.add_event_cost(person, impact.cost, false)?;
        self.add_event_utility(person, impact.util);
        Ok(())
    }
}

/// Reads the `cost` and `utility` columns of a row.
///
/// # Errors
/// Returns a `DataError` if either column is missing or malformed.
pub fn cost_util(row: &Row) -> Result<CostUtil, HepceError> {
    Ok(CostUtil {
        cost: row.double("cost")?,
        util: row.double("utility")?,
    })
}

/// Loads a cost/utility table keyed by `key`.
///
/// # Errors
/// See [`crate::data::load_table`].
pub fn load_cost_util_table<K, F>(
    source: &dyn StratifiedSource,
    table: &str,
    mut key: F,
) -> Result<StratifiedTable<K, CostUtil>, HepceError>
where
    K: Eq + std::hash::Hash,
    F: FnMut(&Row) -> Result<K, HepceError>,
{
    crate::data::load_table(source, table, |row| Ok((key(row)?, cost_util(row)?)))
}

/// (age_years, gender, drug_behavior) → monthly incidence.
pub type IncidenceTable = StratifiedTable<(i32, i32, i32), f64>;

/// Loads an incidence table with the `age_years, gender, drug_behavior, incidence` layout.
///
/// # Errors
/// See [`crate::data::load_table`].
pub fn load_incidence(
    source: &dyn StratifiedSource,
    table: &str,
) -> Result<IncidenceTable, HepceError> {
    crate::data::load_table(source, table, |row| {
        Ok((
            (
                row.int("age_years")?,
                row.int("gender")?,
                row.int("drug_behavior")?,
            ),
            row.double("incidence")?,
        ))
    })
}

/// The (age_years, gender, drug_behavior) key most tables are stratified by.
#[must_use]
pub fn demographic_key(person: &Person) -> (i32, i32, i32) {
    (
        person.age_years(),
        person.sex().code(),
        person.behavior().code(),
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::base_config;
    use super::*;
    use crate::assert_almost_eq;
    use crate::numeric::ACC;
    use crate::sampler::ScriptedSampler;
    use crate::types::DeathReason;

    struct Counting;

    impl Event for Counting {
        fn name(&self) -> &'static str {
            "Counting"
        }

        fn do_event(&self, person: &mut Person, _: &mut dyn Sampler) -> Result<(), HepceError> {
            person.update_timers();
            Ok(())
        }
    }

    #[test]
    fn dead_people_are_skipped() {
        let mut person = Person::new(0);
        let mut sampler = ScriptedSampler::default();
        Counting.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.current_time(), 1);
        person.die(DeathReason::Background);
        Counting.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.current_time(), 1);
    }

    #[test]
    fn event_cost_is_discounted() {
        let base = EventBase::new(
            &base_config(),
            CostCategory::Screening,
            UtilityCategory::Behavior,
        )
        .unwrap();
        let mut person = Person::new(0);
        person.update_timers();
        base.add_event_cost(&mut person, 100.0, false).unwrap();
        let (cost, discounted) = person.costs().get(CostCategory::Screening);
        assert_almost_eq!(cost, 100.0, ACC);
        assert_almost_eq!(discounted, 100.0 / 1.025, ACC);

        base.add_event_cost(&mut person, 12.0, true).unwrap();
        let (_, discounted) = person.costs().get(CostCategory::Screening);
        assert_almost_eq!(discounted, 100.0 / 1.025 + 12.0 / (1.0 + 0.025 / 12.0), ACC);
    }

    #[test]
    fn event_utility_is_last_write() {
        let base = EventBase::new(
            &base_config(),
            CostCategory::Liver,
            UtilityCategory::Liver,
        )
        .unwrap();
        let mut person = Person::new(0);
        base.add_event_utility(&mut person, 0.7);
        base.add_event_utility(&mut person, 0.9);
        assert_eq!(person.utility(UtilityCategory::Liver), 0.9);
    }

    #[test]
    fn configured_events_are_case_insensitive() {
        let config = base_config().with("simulation.events", "Aging, overdose,HIVInfections");
        let base = EventBase::new(&config, CostCategory::Misc, UtilityCategory::Background)
            .unwrap();
        assert!(base.is_event_configured("Overdose"));
        assert!(!base.is_event_configured("Pregnancy"));
        assert!(base.is_hiv_modeled());
    }

    #[test]
    fn negative_discount_rate_is_rejected() {
        let config = base_config().with("cost.discounting_rate", -0.5);
        assert!(EventBase::new(&config, CostCategory::Misc, UtilityCategory::Background).is_err());
    }
}
