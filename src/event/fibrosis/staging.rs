use log::{error, warn};

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::{Event, EventBase};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{CostCategory, FibrosisState, MeasuredFibrosisState, UtilityCategory};

/// Outcomes a staging test can report, in decision-index order.
const MEASURED_OUTCOMES: [MeasuredFibrosisState; 4] = [
    MeasuredFibrosisState::F01,
    MeasuredFibrosisState::F23,
    MeasuredFibrosisState::F4,
    MeasuredFibrosisState::Decomp,
];

/// How a second staging result is combined with the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MultitestMethod {
    Latest,
    Maximum,
    Invalid,
}

impl MultitestMethod {
    fn parse(method: &str) -> Self {
        match method {
            "latest" => MultitestMethod::Latest,
            "maximum" => MultitestMethod::Maximum,
            _ => MultitestMethod::Invalid,
        }
    }
}

/// (fibrosis_state, diagnosed_fibrosis) → probability of that measurement.
type TestCharacteristics = StratifiedTable<(i32, i32), f64>;

/// Simulates clinical fibrosis staging with one or two tests.
pub struct FibrosisStaging {
    base: EventBase,
    period: i32,
    test_one_cost: f64,
    test_two_cost: f64,
    test_two_eligible: Vec<FibrosisState>,
    method: MultitestMethod,
    test_one: TestCharacteristics,
    test_two: Option<TestCharacteristics>,
}

impl FibrosisStaging {
    /// # Errors
    /// Returns an error for negative costs or discount rate, or for an empty table under
    /// `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        let test_one_column = config.get_string("fibrosis_staging.test_one");
        let test_two_column = config.get_string("fibrosis_staging.test_two");
        let method = config.get_string("fibrosis_staging.multitest_result_method");
        let test_two = if test_two_column.is_empty() {
            None
        } else {
            Some(Self::load_test(source, &test_two_column)?)
        };
        Ok(FibrosisStaging {
            base: EventBase::new(config, CostCategory::Staging, UtilityCategory::Liver)?,
            period: config.get_int("fibrosis_staging.period"),
            test_one_cost: config.get_double("fibrosis_staging.test_one_cost", true)?,
            test_two_cost: config.get_double("fibrosis_staging.test_two_cost", true)?,
            test_two_eligible: config.get_vec("fibrosis_staging.test_two_eligible_stages"),
            method: MultitestMethod::parse(&method),
            test_one: Self::load_test(source, &test_one_column)?,
            test_two,
        })
    }

    fn load_test(
        source: &dyn StratifiedSource,
        column: &str,
    ) -> Result<TestCharacteristics, HepceError> {
        load_table(source, "fibrosis", |row| {
            Ok((
                (row.int("fibrosis_state")?, row.int("diagnosed_fibrosis")?),
                row.double(column)?,
            ))
        })
    }

    /// Probability of each measured outcome given the true state, or `None` if the table does
    /// not cover this state.
    fn outcome_probabilities(
        test: &TestCharacteristics,
        state: FibrosisState,
    ) -> Option<Vec<f64>> {
        MEASURED_OUTCOMES
            .iter()
            .map(|measured| test.try_get(&(state.code(), measured.code())).copied())
            .collect()
    }

    /// Draws one test result. Missing characteristics or an out-of-range draw are logged and
    /// yield `None`.
    fn run_test(
        test: &TestCharacteristics,
        person: &Person,
        sampler: &mut dyn Sampler,
    ) -> Option<MeasuredFibrosisState> {
        let Some(probabilities) = Self::outcome_probabilities(test, person.fibrosis_state()) else {
            warn!(
                "No staging test characteristics for fibrosis state {}",
                person.fibrosis_state()
            );
            return None;
        };
        let decision = sampler.get_decision(&probabilities);
        if let Some(measured) = MEASURED_OUTCOMES.get(decision) {
            Some(*measured)
        } else {
            error!("Measured fibrosis state decision {decision} is out of bounds");
            None
        }
    }
}

impl Event for FibrosisStaging {
    fn name(&self) -> &'static str {
        "FibrosisStaging"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if person.fibrosis_state() == FibrosisState::None {
            return Ok(());
        }
        let last_staging = person.staging_details().time_of_last_staging;
        if last_staging != -1 && person.time_since(last_staging) < self.period {
            return Ok(());
        }

        let Some(first) = Self::run_test(&self.test_one, person, sampler) else {
            return Ok(());
        };
        person.diagnose_fibrosis(first);
        self.base.add_event_cost(person, self.test_one_cost, false)?;

        let Some(test_two) = &self.test_two else {
            return Ok(());
        };
        if !self.test_two_eligible.contains(&person.fibrosis_state()) {
            return Ok(());
        }
        let Some(second) = Self::run_test(test_two, person, sampler) else {
            return Ok(());
        };
        person.give_second_staging_test();
        let measured = match self.method {
            MultitestMethod::Latest => second,
            MultitestMethod::Maximum => first.max(second),
            MultitestMethod::Invalid => {
                error!("Unknown fibrosis_staging.multitest_result_method");
                return Ok(());
            }
        };
        person.diagnose_fibrosis(measured);
        self.base.add_event_cost(person, self.test_two_cost, false)
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
        let mut text = String::from("fibrosis_state,diagnosed_fibrosis,fib4,fibroscan\n");
        for state in 0..=5 {
            for measured in 0..4 {
                let p = if state.min(3) == measured { 0.7 } else { 0.1 };
                text.push_str(&format!("{state},{measured},{p},{p}\n"));
            }
        }
        InMemorySource::new().with_csv("fibrosis", &text)
    }

    fn config(method: &str) -> Config {
        base_config()
            .with("fibrosis_staging.test_one", "fib4")
            .with("fibrosis_staging.test_two", "fibroscan")
            .with("fibrosis_staging.period", 12)
            .with("fibrosis_staging.test_one_cost", 100)
            .with("fibrosis_staging.test_two_cost", 250)
            .with("fibrosis_staging.test_two_eligible_stages", "f2,f3")
            .with("fibrosis_staging.multitest_result_method", method)
    }

    fn staged_person(state: FibrosisState) -> Person {
        let mut person = Person::new(0);
        person.infect_hcv();
        person.update_true_fibrosis(state);
        person
    }

    #[test]
    fn single_test_for_ineligible_stage() {
        let event = FibrosisStaging::new(&config("latest"), &source()).unwrap();
        let mut person = staged_person(FibrosisState::F1);
        let mut sampler = ScriptedSampler::new(&[0, 2]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests.len(), 1);
        assert_eq!(sampler.requests[0], vec![0.1, 0.7, 0.1, 0.1]);
        assert_eq!(
            person.staging_details().measured_fibrosis_state,
            MeasuredFibrosisState::F01
        );
        assert!(!person.staging_details().had_second_test);
        assert_eq!(person.costs().get(CostCategory::Staging).0, 100.0);
    }

    #[test]
    fn maximum_of_two_tests() {
        let event = FibrosisStaging::new(&config("maximum"), &source()).unwrap();
        let mut person = staged_person(FibrosisState::F2);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[2, 1]))
            .unwrap();
        let staging = person.staging_details();
        assert_eq!(staging.measured_fibrosis_state, MeasuredFibrosisState::F4);
        assert!(staging.had_second_test);
        assert_eq!(person.costs().get(CostCategory::Staging).0, 350.0);
    }

    #[test]
    fn latest_of_two_tests() {
        let event = FibrosisStaging::new(&config("latest"), &source()).unwrap();
        let mut person = staged_person(FibrosisState::F3);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[2, 1]))
            .unwrap();
        assert_eq!(
            person.staging_details().measured_fibrosis_state,
            MeasuredFibrosisState::F23
        );
    }

    #[test]
    fn unknown_method_keeps_first_result() {
        let event = FibrosisStaging::new(&config("median"), &source()).unwrap();
        let mut person = staged_person(FibrosisState::F2);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[2, 1]))
            .unwrap();
        assert_eq!(
            person.staging_details().measured_fibrosis_state,
            MeasuredFibrosisState::F4
        );
        assert_eq!(person.costs().get(CostCategory::Staging).0, 100.0);
    }

    #[test]
    fn period_limits_restaging() {
        let event = FibrosisStaging::new(&config("latest"), &source()).unwrap();
        let mut person = staged_person(FibrosisState::F1);
        let mut sampler = ScriptedSampler::new(&[0, 0, 0]);
        event.execute(&mut person, &mut sampler).unwrap();
        for _ in 0..11 {
            person.update_timers();
        }
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests.len(), 1);
        person.update_timers();
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests.len(), 2);
    }

    #[test]
    fn out_of_range_draw_aborts() {
        let event = FibrosisStaging::new(&config("latest"), &source()).unwrap();
        let mut person = staged_person(FibrosisState::F1);
        event
            .execute(&mut person, &mut ScriptedSampler::new(&[4]))
            .unwrap();
        assert_eq!(
            person.staging_details().measured_fibrosis_state,
            MeasuredFibrosisState::None
        );
        assert_eq!(person.cost_totals().0, 0.0);
    }

    #[test]
    fn never_infected_is_not_staged() {
        let event = FibrosisStaging::new(&config("latest"), &source()).unwrap();
        let mut person = Person::new(0);
        let mut sampler = ScriptedSampler::new(&[0]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(sampler.requests.is_empty());
    }
}
