use log::debug;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::error::HepceError;
use crate::event::Event;
use crate::numeric::{probability_to_rate, rate_to_probability};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{InfectionType, HCV};

/// Spontaneous clearance of acute HCV.
pub struct Clearance {
    probability: f64,
}

impl Clearance {
    /// Reads `infection.clearance_prob`. A zero or missing value means 25% clearance over the
    /// six acute months, converted to a monthly probability.
    ///
    /// # Errors
    /// Returns an error for a negative probability.
    pub fn new(config: &dyn ConfigSource) -> Result<Self, HepceError> {
        let mut probability = config.get_double("infection.clearance_prob", true)?;
        if probability == 0.0 {
            probability = rate_to_probability(probability_to_rate(0.25)? / 6.0)?;
            debug!("Using default monthly clearance probability {probability}");
        }
        Ok(Clearance { probability })
    }
}

impl Event for Clearance {
    fn name(&self) -> &'static str {
        "Clearance"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        // Clearance while on treatment is counted as an SVR by treatment instead.
        if person.hcv() != HCV::Acute
            || person
                .treatment_details(InfectionType::Hcv)
                .initiated_treatment
        {
            return Ok(());
        }
        if sampler.get_decision(&[self.probability, 1.0 - self.probability]) == 0 {
            person.clear_hcv(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::config::Config;
    use crate::numeric::ACC;
    use crate::sampler::ScriptedSampler;

    #[test]
    fn default_probability() {
        let event = Clearance::new(&Config::new()).unwrap();
        let expected = 1.0 - 0.75_f64.powf(1.0 / 6.0);
        assert_almost_eq!(event.probability, expected, ACC);
    }

    #[test]
    fn clears_acute_infection() {
        let event = Clearance::new(&Config::new().with("infection.clearance_prob", 0.1)).unwrap();
        let mut person = Person::new(0);
        person.infect_hcv();
        let mut sampler = ScriptedSampler::new(&[0]);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(sampler.requests[0], vec![0.1, 0.9]);
        assert_eq!(person.hcv(), HCV::None);
        assert_eq!(person.hcv_details().times_acute_cleared, 1);
    }

    #[test]
    fn chronic_and_treated_are_skipped() {
        let event = Clearance::new(&Config::new().with("infection.clearance_prob", 0.1)).unwrap();
        let mut sampler = ScriptedSampler::new(&[0, 0]);

        let mut chronic = Person::new(0);
        chronic.infect_hcv();
        chronic.set_hcv(HCV::Chronic);
        event.execute(&mut chronic, &mut sampler).unwrap();

        let mut treated = Person::new(1);
        treated.infect_hcv();
        treated.initiate_treatment(InfectionType::Hcv);
        event.execute(&mut treated, &mut sampler).unwrap();

        assert!(sampler.requests.is_empty());
        assert_eq!(treated.hcv(), HCV::Acute);
    }
}
