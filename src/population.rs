//! Population export and import.
//!
//! The CSV layout is fixed: an `id` column followed by [`POPULATION_HEADERS`]. Downstream
//! analysis reads these files positionally, so the column order must not change. States are
//! written as their integer codes and flags as `true`/`false`. Screening, linkage and treatment
//! columns describe the HCV axis.
use std::path::Path;

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use crate::error::HepceError;
use crate::person::{IdAllocator, Person};
use crate::types::{
    Behavior, DeathReason, FibrosisState, InfectionType, LinkageState, LinkageType,
    MeasuredFibrosisState, PregnancyState, Sex, UtilityCategory, HCV,
};

/// The canonical population columns, after the leading `id`.
pub const POPULATION_HEADERS: &str = "sex,age,isAlive,deathReason,identifiedHCV,\
timeInfectionIdentified,HCV,fibrosis_state,is_genotype_three,seropositive,timeHCVChanged,\
time_fibrosis_state_changed,drugBehavior,timeLastActiveDrugUse,linkageState,time_link_change,\
linkageType,link_count,measured_fibrosis_state,time_of_last_staging,time_of_last_screening,\
number_ab_tests,number_rna_tests,times_infected,times_acute_cleared,initiated_treatment,\
time_treatment_initiation,minUtility,multUtility,discountMinUtility,discountMultUtility,\
treatmentWithdrawals,treatmentToxicReactions,completedTreatments,svrs,behaviorUtility,\
liverUtility,treatmentUtility,backgroundUtility,hivUtility,lifeSpan,discountedLifeSpan,\
number_treatment_starts,numberOfRetreatments";

const IT: InfectionType = InfectionType::Hcv;

/// One line of the population file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRow {
    pub id: usize,
    pub sex: i32,
    pub age: i32,
    #[serde(rename = "isAlive")]
    pub is_alive: bool,
    #[serde(rename = "deathReason")]
    pub death_reason: i32,
    #[serde(rename = "identifiedHCV")]
    pub identified_hcv: bool,
    #[serde(rename = "timeInfectionIdentified")]
    pub time_infection_identified: i32,
    #[serde(rename = "HCV")]
    pub hcv: i32,
    pub fibrosis_state: i32,
    pub is_genotype_three: bool,
    pub seropositive: bool,
    #[serde(rename = "timeHCVChanged")]
    pub time_hcv_changed: i32,
    pub time_fibrosis_state_changed: i32,
    #[serde(rename = "drugBehavior")]
    pub drug_behavior: i32,
    #[serde(rename = "timeLastActiveDrugUse")]
    pub time_last_active_drug_use: i32,
    #[serde(rename = "linkageState")]
    pub linkage_state: i32,
    pub time_link_change: i32,
    #[serde(rename = "linkageType")]
    pub linkage_type: i32,
    pub link_count: i32,
    pub measured_fibrosis_state: i32,
    pub time_of_last_staging: i32,
    pub time_of_last_screening: i32,
    pub number_ab_tests: i32,
    pub number_rna_tests: i32,
    pub times_infected: i32,
    pub times_acute_cleared: i32,
    pub initiated_treatment: bool,
    pub time_treatment_initiation: i32,
    #[serde(rename = "minUtility")]
    pub min_utility: f64,
    #[serde(rename = "multUtility")]
    pub mult_utility: f64,
    #[serde(rename = "discountMinUtility")]
    pub discount_min_utility: f64,
    #[serde(rename = "discountMultUtility")]
    pub discount_mult_utility: f64,
    #[serde(rename = "treatmentWithdrawals")]
    pub treatment_withdrawals: i32,
    #[serde(rename = "treatmentToxicReactions")]
    pub treatment_toxic_reactions: i32,
    #[serde(rename = "completedTreatments")]
    pub completed_treatments: i32,
    pub svrs: i32,
    #[serde(rename = "behaviorUtility")]
    pub behavior_utility: f64,
    #[serde(rename = "liverUtility")]
    pub liver_utility: f64,
    #[serde(rename = "treatmentUtility")]
    pub treatment_utility: f64,
    #[serde(rename = "backgroundUtility")]
    pub background_utility: f64,
    #[serde(rename = "hivUtility")]
    pub hiv_utility: f64,
    #[serde(rename = "lifeSpan")]
    pub life_span: i32,
    #[serde(rename = "discountedLifeSpan")]
    pub discounted_life_span: f64,
    pub number_treatment_starts: i32,
    #[serde(rename = "numberOfRetreatments")]
    pub number_of_retreatments: i32,
}

impl From<&Person> for PopulationRow {
    fn from(person: &Person) -> Self {
        let hcv = person.hcv_details();
        let screening = person.screening_details(IT);
        let linkage = person.linkage_details(IT);
        let treatment = person.treatment_details(IT);
        let staging = person.staging_details();
        let lifetime = person.lifetime_utility();
        PopulationRow {
            id: person.id(),
            sex: person.sex().code(),
            age: person.age(),
            is_alive: person.is_alive(),
            death_reason: person.death_reason().code(),
            identified_hcv: screening.identified,
            time_infection_identified: screening.time_identified,
            hcv: hcv.hcv.code(),
            fibrosis_state: hcv.fibrosis_state.code(),
            is_genotype_three: hcv.is_genotype_three,
            seropositive: hcv.seropositive,
            time_hcv_changed: hcv.time_changed,
            time_fibrosis_state_changed: hcv.time_fibrosis_state_changed,
            drug_behavior: person.behavior().code(),
            time_last_active_drug_use: person.behavior_details().time_last_active,
            linkage_state: linkage.link_state.code(),
            time_link_change: linkage.time_link_change,
            linkage_type: linkage.link_type.code(),
            link_count: linkage.link_count,
            measured_fibrosis_state: staging.measured_fibrosis_state.code(),
            time_of_last_staging: staging.time_of_last_staging,
            time_of_last_screening: screening.time_of_last_screening,
            number_ab_tests: screening.num_ab_tests,
            number_rna_tests: screening.num_rna_tests,
            times_infected: hcv.times_infected,
            times_acute_cleared: hcv.times_acute_cleared,
            initiated_treatment: treatment.initiated_treatment,
            time_treatment_initiation: treatment.time_of_treatment_initiation,
            min_utility: lifetime.min_util,
            mult_utility: lifetime.mult_util,
            discount_min_utility: lifetime.discount_min_util,
            discount_mult_utility: lifetime.discount_mult_util,
            treatment_withdrawals: treatment.num_withdrawals,
            treatment_toxic_reactions: treatment.num_toxic_reactions,
            completed_treatments: treatment.num_completed,
            svrs: hcv.svrs,
            behavior_utility: person.utility(UtilityCategory::Behavior),
            liver_utility: person.utility(UtilityCategory::Liver),
            treatment_utility: person.utility(UtilityCategory::Treatment),
            background_utility: person.utility(UtilityCategory::Background),
            hiv_utility: person.utility(UtilityCategory::Hiv),
            life_span: person.life_span(),
            discounted_life_span: person.discounted_life_span(),
            number_treatment_starts: treatment.num_starts,
            number_of_retreatments: treatment.num_retreatments,
        }
    }
}

fn decode<T>(code: i32, column: &str, from_code: fn(i32) -> Option<T>) -> Result<T, HepceError> {
    from_code(code)
        .ok_or_else(|| HepceError::DataError(format!("column `{column}` has unknown code {code}")))
}

impl Person {
    /// Rebuilds a person from a population row under a freshly allocated `id`.
    ///
    /// # Errors
    /// Returns a `DataError` when a state column holds an unknown code.
    pub fn from_row(id: usize, row: PopulationRow) -> Result<Person, HepceError> {
        let mut person = Person::new(id);
        person.sex = decode(row.sex, "sex", Sex::from_code)?;
        person.age = row.age;
        person.is_alive = row.is_alive;
        person.death_reason = decode(row.death_reason, "deathReason", DeathReason::from_code)?;

        let hcv = &mut person.hcv;
        hcv.hcv = decode(row.hcv, "HCV", HCV::from_code)?;
        hcv.fibrosis_state = decode(
            row.fibrosis_state,
            "fibrosis_state",
            FibrosisState::from_code,
        )?;
        hcv.is_genotype_three = row.is_genotype_three;
        hcv.seropositive = row.seropositive;
        hcv.time_changed = row.time_hcv_changed;
        hcv.time_fibrosis_state_changed = row.time_fibrosis_state_changed;
        hcv.times_infected = row.times_infected;
        hcv.times_acute_cleared = row.times_acute_cleared;
        hcv.svrs = row.svrs;

        person.behavior.behavior = decode(row.drug_behavior, "drugBehavior", Behavior::from_code)?;
        person.behavior.time_last_active = row.time_last_active_drug_use;

        let screening = &mut person.screening[IT.index()];
        screening.identified = row.identified_hcv;
        screening.time_identified = row.time_infection_identified;
        screening.time_of_last_screening = row.time_of_last_screening;
        screening.num_ab_tests = row.number_ab_tests;
        screening.num_rna_tests = row.number_rna_tests;

        let linkage = &mut person.linkage[IT.index()];
        linkage.link_state = decode(row.linkage_state, "linkageState", LinkageState::from_code)?;
        linkage.time_link_change = row.time_link_change;
        linkage.link_type = decode(row.linkage_type, "linkageType", LinkageType::from_code)?;
        linkage.link_count = row.link_count;

        person.staging.measured_fibrosis_state = decode(
            row.measured_fibrosis_state,
            "measured_fibrosis_state",
            MeasuredFibrosisState::from_code,
        )?;
        person.staging.time_of_last_staging = row.time_of_last_staging;

        let treatment = &mut person.treatment[IT.index()];
        treatment.initiated_treatment = row.initiated_treatment;
        treatment.time_of_treatment_initiation = row.time_treatment_initiation;
        treatment.num_withdrawals = row.treatment_withdrawals;
        treatment.num_toxic_reactions = row.treatment_toxic_reactions;
        treatment.num_completed = row.completed_treatments;
        treatment.num_starts = row.number_treatment_starts;
        treatment.num_retreatments = row.number_of_retreatments;

        let lifetime = &mut person.lifetime_utility;
        lifetime.min_util = row.min_utility;
        lifetime.mult_util = row.mult_utility;
        lifetime.discount_min_util = row.discount_min_utility;
        lifetime.discount_mult_util = row.discount_mult_utility;

        person.set_utility(row.behavior_utility, UtilityCategory::Behavior);
        person.set_utility(row.liver_utility, UtilityCategory::Liver);
        person.set_utility(row.treatment_utility, UtilityCategory::Treatment);
        person.set_utility(row.background_utility, UtilityCategory::Background);
        person.set_utility(row.hiv_utility, UtilityCategory::Hiv);
        person.life_span = row.life_span;
        person.discounted_life_span = row.discounted_life_span;
        Ok(person)
    }

    /// Builds a person from one row of an initial-conditions table.
    ///
    /// The fields are, in order: id, age, sex, drug behavior, time last active, seropositive,
    /// genotype three, fibrosis state, identified, linkage state, HCV state and, optionally,
    /// pregnancy state. The leading id field is ignored in favor of `id`. Flags are `1` for
    /// true. An identified person is also antibody positive, and a person who starts pregnant
    /// does so at time 0.
    ///
    /// # Errors
    /// Returns a `DataError` for a field count other than 11 or 12, a non-integer field, or an
    /// unknown state code.
    pub fn from_initial_conditions(id: usize, values: &[&str]) -> Result<Person, HepceError> {
        if !(11..=12).contains(&values.len()) {
            return Err(HepceError::DataError(format!(
                "initial conditions need 11 or 12 fields, got {}",
                values.len()
            )));
        }
        let field = |index: usize, name: &str| -> Result<i32, HepceError> {
            let text = values[index].trim();
            text.parse::<i32>().map_err(|_| {
                HepceError::DataError(format!(
                    "initial condition `{name}` value `{text}` is not an integer"
                ))
            })
        };

        let mut person = Person::new(id);
        person.age = field(1, "age")?;
        person.sex = decode(field(2, "sex")?, "sex", Sex::from_code)?;
        person.behavior.behavior =
            decode(field(3, "behavior")?, "behavior", Behavior::from_code)?;
        person.behavior.time_last_active = field(4, "time_last_active")?;
        person.hcv.seropositive = field(5, "seropositive")? == 1;
        person.hcv.is_genotype_three = field(6, "genotype_three")? == 1;
        person.hcv.fibrosis_state = decode(
            field(7, "fibrosis_state")?,
            "fibrosis_state",
            FibrosisState::from_code,
        )?;
        if field(8, "identified")? == 1 {
            let screening = &mut person.screening[IT.index()];
            screening.identified = true;
            screening.ab_positive = true;
        }
        person.linkage[IT.index()].link_state = decode(
            field(9, "link_state")?,
            "link_state",
            LinkageState::from_code,
        )?;
        person.hcv.hcv = decode(field(10, "hcv")?, "hcv", HCV::from_code)?;

        if values.len() == 12 {
            let state = decode(
                field(11, "pregnancy_state")?,
                "pregnancy_state",
                PregnancyState::from_code,
            )?;
            person.pregnancy.pregnancy_state = state;
            if state == PregnancyState::Pregnant {
                person.pregnancy.time_of_pregnancy_change = 0;
            }
        }
        Ok(person)
    }
}

/// Writes `persons` to `path` with the canonical header.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_population<'a>(
    path: impl AsRef<Path>,
    persons: impl IntoIterator<Item = &'a Person>,
) -> Result<(), HepceError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let mut count = 0;
    for person in persons {
        writer.serialize(PopulationRow::from(person))?;
        count += 1;
    }
    writer.flush()?;
    info!("Wrote {count} people to {}", path.as_ref().display());
    Ok(())
}

/// Reads a population file written by [`write_population`]. Ids come from `ids`, not from the
/// file.
///
/// # Errors
/// Returns an error if the file cannot be read, a row does not match the header, or a state
/// column holds an unknown code.
pub fn read_population(
    path: impl AsRef<Path>,
    ids: &mut IdAllocator,
) -> Result<Vec<Person>, HepceError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut population = Vec::new();
    for record in reader.deserialize::<PopulationRow>() {
        population.push(Person::from_row(ids.next_id(), record?)?);
    }
    debug!(
        "Read {} people from {}",
        population.len(),
        path.as_ref().display()
    );
    Ok(population)
}
