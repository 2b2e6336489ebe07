use crate::data::StratifiedSource;
use crate::error::HepceError;
use crate::event::{demographic_key, load_incidence, Event, IncidenceTable};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::HIV;

/// New HIV infections, drawn from `hiv_incidence`.
pub struct Infection {
    incidence: IncidenceTable,
}

impl Infection {
    /// # Errors
    /// Returns an error for an empty incidence table under `exit_on_warning`.
    pub fn new(source: &dyn StratifiedSource) -> Result<Self, HepceError> {
        Ok(Infection {
            incidence: load_incidence(source, "hiv_incidence")?,
        })
    }
}

impl Event for Infection {
    fn name(&self) -> &'static str {
        "HIVInfections"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        if person.hiv() != HIV::None {
            return Ok(());
        }
        let incidence = self.incidence.get(&demographic_key(person));
        if sampler.get_decision(&[incidence]) == 0 {
            person.infect_hiv();
        }
        Ok(())
    }
}
