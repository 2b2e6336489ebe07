use crate::config::ConfigSource;
use crate::data::{StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{demographic_key, load_cost_util_table, Event, EventBase};
use crate::numeric::discount;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{CostCategory, CostUtil, UtilityCategory};

/// Advances a person one month and accrues background cost, utility and life-years.
pub struct Aging {
    base: EventBase,
    /// (age_years, gender, drug_behavior)
    background: StratifiedTable<(i32, i32, i32), CostUtil>,
}

impl Aging {
    /// # Errors
    /// Returns an error for a negative discount rate, or for an empty table under
    /// `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(Aging {
            base: EventBase::new(config, CostCategory::Background, UtilityCategory::Background)?,
            background: load_cost_util_table(source, "background_impacts", |row| {
                Ok((
                    row.int("age_years")?,
                    row.int("gender")?,
                    row.int("drug_behavior")?,
                ))
            })?,
        })
    }
}

impl Event for Aging {
    fn name(&self) -> &'static str {
        "Aging"
    }

    fn do_event(&self, person: &mut Person, _sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        person.grow();
        let impact = self.background.get(&demographic_key(person));
        self.base.add_cost_and_utility(person, impact)?;
        person.accumulate_total_utility(self.base.discount_rate())?;
        person.add_discounted_life_span(discount(
            1.0,
            self.base.discount_rate(),
            person.current_time(),
            false,
        )?);
        Ok(())
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

    fn aging() -> Aging {
        let source = InMemorySource::new().with_csv(
            "background_impacts",
            "age_years,gender,drug_behavior,cost,utility\n25,0,4,25,0.5\n",
        );
        Aging::new(&base_config(), &source).unwrap()
    }

    #[test]
    fn background_cost_and_utility() {
        let mut person = Person::new(0);
        person.set_age(300);
        person.set_behavior(Behavior::Injection);
        let mut sampler = ScriptedSampler::default();
        aging().execute(&mut person, &mut sampler).unwrap();

        assert_eq!(person.age(), 301);
        let (cost, discounted) = person.costs().get(CostCategory::Background);
        assert_almost_eq!(cost, 25.0, ACC);
        assert_almost_eq!(discounted, 25.0 / 1.025, ACC);
        assert_eq!(person.utility(UtilityCategory::Background), 0.5);
        assert_almost_eq!(person.discounted_life_span(), 1.0 / 1.025, ACC);
        assert_almost_eq!(person.lifetime_utility().min_util, 0.5, ACC);
        // Aging never draws.
        assert!(sampler.requests.is_empty());
    }

    #[test]
    fn untabulated_stratum_costs_nothing() {
        let mut person = Person::new(0);
        person.set_age(600);
        aging()
            .execute(&mut person, &mut ScriptedSampler::default())
            .unwrap();
        assert_eq!(person.cost_totals(), (0.0, 0.0));
        assert_eq!(person.utility(UtilityCategory::Background), 0.0);
        assert_eq!(person.life_span(), 1);
    }
}
