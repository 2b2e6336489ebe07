use log::warn;

use crate::config::{ConfigSource, ConfigSourceExt};
use crate::data::{load_table, Row, StratifiedSource, StratifiedTable};
use crate::error::HepceError;
use crate::event::policy::InfectionPolicy;
use crate::event::treatment::TreatmentCore;
use crate::event::Event;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::types::{InfectionType, HIV};

const IT: InfectionType = InfectionType::Hiv;

/// One row of `hiv_treatments`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Course {
    cost: f64,
    toxicity_probability: f64,
    withdrawal_probability: f64,
    months_to_suppression: i32,
    months_to_high_cd4: i32,
}

/// Reads a flag cell: `on` (such as `high`) is 1, its opposite (`low`) is 0, and anything else
/// must be an integer code.
fn flag(row: &Row, column: &str, on: &str) -> Result<i32, HepceError> {
    let text = row.text(column)?;
    if text.eq_ignore_ascii_case(on) {
        return Ok(1);
    }
    if text.eq_ignore_ascii_case(off_word(on)) {
        return Ok(0);
    }
    row.int(column)
}

fn off_word(on: &str) -> &'static str {
    if on.eq_ignore_ascii_case("high") {
        "low"
    } else {
        "off"
    }
}

/// Antiretroviral therapy on a single configured course. Staying on treatment long enough
/// suppresses the virus and later restores a low CD4 count; withdrawing loses suppression.
pub struct Treatment {
    core: TreatmentCore,
    course: Course,
    /// (on_treatment, high_cd4) → utility
    utilities: StratifiedTable<(i32, i32), f64>,
}

impl Treatment {
    /// # Errors
    /// Returns an error for a negative treatment parameter or discount rate, or for an empty
    /// table under `exit_on_warning`.
    pub fn new(
        config: &dyn ConfigSource,
        source: &dyn StratifiedSource,
    ) -> Result<Self, HepceError> {
        let course_name = config.get_string("hiv_treatment.course");
        let courses = load_table(source, "hiv_treatments", |row| {
            Ok((
                row.text("course")?.to_string(),
                Course {
                    cost: row.double("cost")?,
                    toxicity_probability: row.double("toxicity_prob")?,
                    withdrawal_probability: row.double("withdrawal_prob")?,
                    months_to_suppression: row.int("months_to_suppression")?,
                    months_to_high_cd4: row.int("months_to_high_cd4")?,
                },
            ))
        })?;
        let course = match courses.try_get(&course_name) {
            Some(course) => *course,
            None => {
                warn!("HIV treatment course `{course_name}` not found in hiv_treatments");
                Course::default()
            }
        };
        if course.withdrawal_probability == 0.0 {
            warn!("HIV treatment withdrawal probability is 0");
        }
        Ok(Treatment {
            core: TreatmentCore::new(config, source, InfectionPolicy::HIV)?,
            course,
            utilities: load_table(source, "HIV_table", |row| {
                Ok((
                    (flag(row, "HIV_trt", "on")?, flag(row, "CD4_count", "high")?),
                    row.double("utility")?,
                ))
            })?,
        })
    }

    /// Utility for the person's CD4 level, on or off treatment. `None` when not infected.
    fn utility(&self, person: &Person, on_treatment: bool) -> Option<f64> {
        let hiv = person.hiv();
        if hiv == HIV::None {
            return None;
        }
        let key = (i32::from(on_treatment), i32::from(hiv.is_high_cd4()));
        Some(self.utilities.get(&key))
    }

    fn lose_suppression(person: &mut Person) {
        match person.hiv() {
            HIV::HiSu => person.set_hiv(HIV::HiUn),
            HIV::LoSu => person.set_hiv(HIV::LoUn),
            _ => {}
        }
    }

    fn apply_suppression(person: &mut Person) {
        match person.hiv() {
            HIV::HiUn => person.set_hiv(HIV::HiSu),
            HIV::LoUn => person.set_hiv(HIV::LoSu),
            _ => {}
        }
    }

    fn restore_high_cd4(person: &mut Person) {
        match person.hiv() {
            HIV::LoUn => person.set_hiv(HIV::HiUn),
            HIV::LoSu => person.set_hiv(HIV::HiSu),
            _ => {}
        }
    }
}

impl Event for Treatment {
    fn name(&self) -> &'static str {
        "HIVTreatment"
    }

    fn do_event(&self, person: &mut Person, sampler: &mut dyn Sampler) -> Result<(), HepceError> {
        let visit_cost = self.core.settings().treatment_cost;
        let reset = self.utility(person, false);
        if !self.core.begin_visit(person, sampler, visit_cost, reset)? {
            return Ok(());
        }

        match self.utility(person, true) {
            Some(utility) => self.core.charge_course(person, self.course.cost, utility)?,
            None => self.core.base().add_event_cost(person, self.course.cost, false)?,
        }
        self.core
            .check_toxicity(person, sampler, self.course.toxicity_probability)?;
        if self
            .core
            .withdraws(person, sampler, self.course.withdrawal_probability)
        {
            Self::lose_suppression(person);
            let reset = self.utility(person, false);
            self.core.quit_engagement(person, reset);
            return Ok(());
        }

        let months = self.core.months_on_treatment(person);
        if months == self.course.months_to_suppression {
            Self::apply_suppression(person);
        }
        if person.hiv().is_low_cd4() && months == self.course.months_to_high_cd4 {
            Self::restore_high_cd4(person);
        }
        Ok(())
    }
}
