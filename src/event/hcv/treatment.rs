use log::debug;

use crate::config::ConfigSource;
use crate::data::{load_table, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::policy::InfectionPolicy;
use crate::event::treatment::TreatmentCore;
use crate::event::Event;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::InfectionType;

const IT: InfectionType = InfectionType::Hcv;

/// One row of the `treatments` table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Course {
    duration: i32,
    cost: f64,
    svr_probability: f64,
    toxicity_probability: f64,
    withdrawal_probability: f64,
}

/// HCV direct-acting antiviral treatment. A first course that completes without a cure moves the
/// person onto a salvage course; a failed salvage course ends care.
pub struct Treatment {
    core: TreatmentCore,
    /// (retreatment, genotype_three, cirrhotic)
    courses: StratifiedTable<(i32, i32, i32), Course>,
}

impl Treatment {
    /// # Errors
    /// Returns an error for a negative treatment parameter or discount rate, or for an empty
    /// `treatments` table under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        Ok(Treatment {
            core: TreatmentCore::new(config, source, InfectionPolicy::HCV)?,
            courses: load_table(source, "treatments", |row| {
                Ok((
                    (
                        row.int("retreatment")?,
                        row.int("genotype_three")?,
                        row.int("cirrhotic")?,
                    ),
                    Course {
                        duration: row.int("duration")?,
                        cost: row.double("cost")?,
                        svr_probability: row.double("svr_prob_if_completed")?,
                        toxicity_probability: row.double("toxicity_prob_if_withdrawal")?,
                        withdrawal_probability: row.double("withdrawal")?,
                    },
                ))
            })?,
        })
    }

    fn course(&self, person: &Person) -> Course {
        let key = (
            i32::from(person.treatment_details(IT).retreatment),
            i32::from(person.hcv_details().is_genotype_three),
            i32::from(person.is_cirrhotic()),
        );
        self.courses.get(&key)
    }

    /// Anyone who has finished or abandoned a course pays the salvage visit price.
    fn visit_cost(&self, person: &Person) -> f64 {
        let treatment = person.treatment_details(IT);
        let settings = self.core.settings();
        if treatment.num_withdrawals + treatment.num_completed > 0 {
            settings.salvage_cost
        } else {
            settings.treatment_cost
        }
    }

    fn quit(&self, person: &mut Person) {
        self.core.quit_engagement(person, Some(1.0));
    }
}

impl Event for Treatment {
    fn name(&self) -> &'static str {
        "Treatment"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let visit_cost = self.visit_cost(person);
        if !self
            .core
            .begin_visit(person, sampler, visit_cost, Some(1.0))?
        {
            return Ok(());
        }

        let course = self.course(person);
        self.core.charge_course(
            person,
            course.cost,
            self.core.settings().treatment_utility,
        )?;
        self.core
            .check_toxicity(person, sampler, course.toxicity_probability)?;
        if self
            .core
            .withdraws(person, sampler, course.withdrawal_probability)
        {
            self.quit(person);
            return Ok(());
        }

        if self.core.months_on_treatment(person) != course.duration {
            return Ok(());
        }
        person.add_completed_treatment(IT);
        if sampler.get_decision(&[course.svr_probability]) == 0 {
            debug!("Person {} achieved SVR", person.id());
            person.add_svr();
            person.clear_hcv(false);
            person.clear_diagnosis(IT);
            self.quit(person);
        } else if !person.treatment_details(IT).retreatment {
            person.initiate_treatment(IT);
        } else {
            self.quit(person);
        }
        Ok(())
    }
}
