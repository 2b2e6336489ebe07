use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::StratifiedSource;
use crate::error::HepceError;
use crate::event::{demographic_key, load_incidence, Event, IncidenceTable};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::HCV;

/// Months an untreated, uncleared acute infection lasts before it becomes chronic.
const ACUTE_MONTHS: i32 = 6;

/// New HCV infections, and the acute to chronic transition of existing ones.
pub struct Infection {
    genotype_three_probability: f64,
    incidence: IncidenceTable,
}

impl Infection {
    /// # Errors
    /// Returns an error for a negative genotype-three probability, or for an empty incidence
    /// table under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(Infection {
            genotype_three_probability: config.get_double("infection.genotype_three_prob", true)?,
            incidence: load_incidence(source, "incidence")?,
        })
    }
}

impl Event for Infection {
    fn name(&self) -> &'static str {
        "Infections"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let details = person.hcv_details();
        if details.hcv == HCV::Acute && person.time_since(details.time_changed) == ACUTE_MONTHS {
            person.set_hcv(HCV::Chronic);
        }
        if person.hcv() != HCV::None {
            return Ok(());
        }

        let incidence = self.incidence.get(&demographic_key(person));
        if sampler.get_decision(&[incidence]) != 0 {
            return Ok(());
        }
        person.infect_hcv();
        if sampler.get_decision(&[self.genotype_three_probability]) == 0 {
            person.set_genotype_three(true);
        }
        Ok(())
    }
}
