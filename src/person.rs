//! The simulated individual.
//!
//! A [`Person`] is mutated only by events. Every state change that has a "time of change" field
//! stamps it with the person's own timestep counter, which [`Person::update_timers`] advances
//! once per month.
use strum::EnumCount;

use crate::error::HepceError;
use crate::numeric::discount;
use crate::types::{
    Behavior, BehaviorDetails, Child, CostCategory, DeathReason, FibrosisState, HCVDetails,
    HIVDetails, InfectionType, LifetimeUtility, LinkageDetails, LinkageState, LinkageType,
    MOUDDetails, MeasuredFibrosisState, PregnancyDetails, PregnancyState, ScreeningDetails, Sex,
    StagingDetails, TreatmentDetails, UtilityCategory, HCV, HIV, MOUD,
};

/// Age at which everyone dies, in months.
pub const MAX_AGE: i32 = 1200;

/// Hands out sequential person ids. Owned by whoever builds the population.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        IdAllocator::default()
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Base and discounted cost totals per category.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTracker {
    totals: [(f64, f64); CostCategory::COUNT],
}

impl Default for CostTracker {
    fn default() -> Self {
        CostTracker {
            totals: [(0.0, 0.0); CostCategory::COUNT],
        }
    }
}

impl CostTracker {
    pub fn add(&mut self, base: f64, discounted: f64, category: CostCategory) {
        let entry = &mut self.totals[category as usize];
        entry.0 += base;
        entry.1 += discounted;
    }

    #[must_use]
    pub fn get(&self, category: CostCategory) -> (f64, f64) {
        self.totals[category as usize]
    }

    #[must_use]
    pub fn total(&self) -> (f64, f64) {
        self.totals
            .iter()
            .fold((0.0, 0.0), |acc, (b, d)| (acc.0 + b, acc.1 + d))
    }
}

/// The most recent utility set for each category.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityTracker {
    values: [f64; UtilityCategory::COUNT],
}

impl Default for UtilityTracker {
    fn default() -> Self {
        UtilityTracker {
            values: [1.0; UtilityCategory::COUNT],
        }
    }
}

impl UtilityTracker {
    pub fn set(&mut self, value: f64, category: UtilityCategory) {
        self.values[category as usize] = value;
    }

    #[must_use]
    pub fn get(&self, category: UtilityCategory) -> f64 {
        self.values[category as usize]
    }

    /// `(minimum, product)` across categories. The product is exactly zero whenever the minimum
    /// is.
    #[must_use]
    pub fn current(&self) -> (f64, f64) {
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        if min == 0.0 {
            return (0.0, 0.0);
        }
        (min, self.values.iter().product())
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub(crate) id: usize,
    pub(crate) sex: Sex,
    pub(crate) age: i32,
    pub(crate) is_alive: bool,
    pub(crate) death_reason: DeathReason,
    pub(crate) current_time: i32,
    pub(crate) boomer: bool,
    pub(crate) overdosing: bool,
    pub(crate) num_overdoses: i32,
    pub(crate) hcv: HCVDetails,
    pub(crate) hiv: HIVDetails,
    pub(crate) behavior: BehaviorDetails,
    pub(crate) moud: MOUDDetails,
    pub(crate) pregnancy: PregnancyDetails,
    pub(crate) staging: StagingDetails,
    pub(crate) screening: [ScreeningDetails; 2],
    pub(crate) linkage: [LinkageDetails; 2],
    pub(crate) treatment: [TreatmentDetails; 2],
    pub(crate) costs: CostTracker,
    pub(crate) utilities: UtilityTracker,
    pub(crate) lifetime_utility: LifetimeUtility,
    pub(crate) life_span: i32,
    pub(crate) discounted_life_span: f64,
}

impl Person {
    /// A living newborn-state male with every counter at zero and every time stamp unset.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Person {
            id,
            sex: Sex::Male,
            age: 0,
            is_alive: true,
            death_reason: DeathReason::Na,
            current_time: 0,
            boomer: false,
            overdosing: false,
            num_overdoses: 0,
            hcv: HCVDetails::default(),
            hiv: HIVDetails::default(),
            behavior: BehaviorDetails::default(),
            moud: MOUDDetails::default(),
            pregnancy: PregnancyDetails::default(),
            staging: StagingDetails::default(),
            screening: Default::default(),
            linkage: Default::default(),
            treatment: Default::default(),
            costs: CostTracker::default(),
            utilities: UtilityTracker::default(),
            lifetime_utility: LifetimeUtility::default(),
            life_span: 0,
            discounted_life_span: 0.0,
        }
    }

    // Identity and time

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn set_sex(&mut self, sex: Sex) {
        self.sex = sex;
    }

    /// Age in months.
    #[must_use]
    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn set_age(&mut self, age: i32) {
        self.age = age;
    }

    /// Age in whole years, the age component of table keys.
    #[must_use]
    pub fn age_years(&self) -> i32 {
        self.age / 12
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    #[must_use]
    pub fn death_reason(&self) -> DeathReason {
        self.death_reason
    }

    pub fn die(&mut self, reason: DeathReason) {
        self.is_alive = false;
        self.death_reason = reason;
    }

    #[must_use]
    pub fn current_time(&self) -> i32 {
        self.current_time
    }

    /// Months elapsed since `time`. An unset (`-1`) stamp yields `current_time + 1`.
    #[must_use]
    pub fn time_since(&self, time: i32) -> i32 {
        self.current_time - time
    }

    #[must_use]
    pub fn is_boomer(&self) -> bool {
        self.boomer
    }

    pub fn set_boomer(&mut self, boomer: bool) {
        self.boomer = boomer;
    }

    /// Advances the timestep and the month counters that depend on current state.
    pub fn update_timers(&mut self) {
        self.current_time += 1;
        if self.behavior.behavior.is_active() {
            self.behavior.time_last_active = self.current_time;
        }
        if self.moud.moud_state == MOUD::Current {
            self.moud.total_moud_months += 1;
        }
        if self.hiv.hiv.is_low_cd4() {
            self.hiv.low_cd4_months_count += 1;
        }
        self.moud.current_state_concurrent_months += 1;
    }

    /// One month passes: timers advance, then age and undiscounted life span grow.
    pub fn grow(&mut self) {
        self.update_timers();
        self.age += 1;
        self.life_span += 1;
    }

    // HCV

    #[must_use]
    pub fn hcv_details(&self) -> &HCVDetails {
        &self.hcv
    }

    #[must_use]
    pub fn hcv(&self) -> HCV {
        self.hcv.hcv
    }

    pub fn set_hcv(&mut self, hcv: HCV) {
        self.hcv.hcv = hcv;
        self.hcv.time_changed = self.current_time;
    }

    /// Acute infection. Already infected people are unaffected.
    pub fn infect_hcv(&mut self) {
        if self.hcv.hcv != HCV::None {
            return;
        }
        self.set_hcv(HCV::Acute);
        self.hcv.seropositive = true;
        self.hcv.times_infected += 1;
        if self.hcv.fibrosis_state == FibrosisState::None {
            self.update_true_fibrosis(FibrosisState::F0);
        }
    }

    /// Ends the infection. Fibrosis already accumulated is kept.
    pub fn clear_hcv(&mut self, acute: bool) {
        self.set_hcv(HCV::None);
        if acute {
            self.hcv.times_acute_cleared += 1;
        }
    }

    pub fn set_genotype_three(&mut self, genotype_three: bool) {
        self.hcv.is_genotype_three = genotype_three;
    }

    pub fn set_seropositive(&mut self, seropositive: bool) {
        self.hcv.seropositive = seropositive;
    }

    pub fn add_svr(&mut self) {
        self.hcv.svrs += 1;
    }

    // Fibrosis

    #[must_use]
    pub fn fibrosis_state(&self) -> FibrosisState {
        self.hcv.fibrosis_state
    }

    #[must_use]
    pub fn is_cirrhotic(&self) -> bool {
        self.hcv.fibrosis_state.is_cirrhotic()
    }

    pub fn update_true_fibrosis(&mut self, state: FibrosisState) {
        self.hcv.fibrosis_state = state;
        self.hcv.time_fibrosis_state_changed = self.current_time;
    }

    #[must_use]
    pub fn staging_details(&self) -> &StagingDetails {
        &self.staging
    }

    pub fn diagnose_fibrosis(&mut self, measured: MeasuredFibrosisState) {
        self.staging.measured_fibrosis_state = measured;
        self.staging.time_of_last_staging = self.current_time;
    }

    pub fn give_second_staging_test(&mut self) {
        self.staging.had_second_test = true;
    }

    // HIV

    #[must_use]
    pub fn hiv_details(&self) -> &HIVDetails {
        &self.hiv
    }

    #[must_use]
    pub fn hiv(&self) -> HIV {
        self.hiv.hiv
    }

    pub fn set_hiv(&mut self, hiv: HIV) {
        if self.hiv.hiv == hiv {
            return;
        }
        self.hiv.hiv = hiv;
        self.hiv.time_changed = self.current_time;
    }

    /// New infections start with a high, unsuppressed CD4 count.
    pub fn infect_hiv(&mut self) {
        if self.hiv.hiv != HIV::None {
            return;
        }
        self.set_hiv(HIV::HiUn);
    }

    // Infection-typed screening, linkage and treatment

    #[must_use]
    pub fn screening_details(&self, it: InfectionType) -> &ScreeningDetails {
        &self.screening[it.index()]
    }

    #[must_use]
    pub fn is_identified(&self, it: InfectionType) -> bool {
        self.screening[it.index()].identified
    }

    /// Stamps the time of the last screening.
    pub fn mark_screened(&mut self, it: InfectionType) {
        self.screening[it.index()].time_of_last_screening = self.current_time;
    }

    pub fn add_ab_screen(&mut self, it: InfectionType) {
        self.mark_screened(it);
        self.screening[it.index()].num_ab_tests += 1;
    }

    pub fn add_rna_screen(&mut self, it: InfectionType) {
        self.mark_screened(it);
        self.screening[it.index()].num_rna_tests += 1;
    }

    pub fn set_antibody_positive(&mut self, it: InfectionType, positive: bool) {
        self.screening[it.index()].ab_positive = positive;
    }

    pub fn diagnose(&mut self, it: InfectionType) {
        let screening = &mut self.screening[it.index()];
        screening.identified = true;
        screening.time_identified = self.current_time;
        screening.ab_positive = true;
    }

    pub fn clear_diagnosis(&mut self, it: InfectionType) {
        self.screening[it.index()].identified = false;
    }

    pub fn add_false_negative(&mut self, it: InfectionType) {
        self.screening[it.index()].num_false_negatives += 1;
    }

    #[must_use]
    pub fn linkage_details(&self, it: InfectionType) -> &LinkageDetails {
        &self.linkage[it.index()]
    }

    #[must_use]
    pub fn linkage_state(&self, it: InfectionType) -> LinkageState {
        self.linkage[it.index()].link_state
    }

    pub fn link(&mut self, link_type: LinkageType, it: InfectionType) {
        let linkage = &mut self.linkage[it.index()];
        linkage.link_state = LinkageState::Linked;
        linkage.time_link_change = self.current_time;
        linkage.link_type = link_type;
        linkage.link_count += 1;
    }

    pub fn unlink(&mut self, it: InfectionType) {
        let linkage = &mut self.linkage[it.index()];
        linkage.link_state = LinkageState::Unlinked;
        linkage.time_link_change = self.current_time;
    }

    pub fn set_linkage_type(&mut self, link_type: LinkageType, it: InfectionType) {
        self.linkage[it.index()].link_type = link_type;
    }

    #[must_use]
    pub fn treatment_details(&self, it: InfectionType) -> &TreatmentDetails {
        &self.treatment[it.index()]
    }

    /// Starts a course. Starting while already on a first-line course moves to retreatment;
    /// starting while already in retreatment does nothing.
    pub fn initiate_treatment(&mut self, it: InfectionType) {
        let treatment = &mut self.treatment[it.index()];
        if treatment.initiated_treatment {
            if treatment.retreatment {
                return;
            }
            treatment.retreatment = true;
            treatment.num_retreatments += 1;
        } else {
            treatment.initiated_treatment = true;
        }
        treatment.num_starts += 1;
        treatment.time_of_treatment_initiation = self.current_time;
    }

    pub fn end_treatment(&mut self, it: InfectionType) {
        let treatment = &mut self.treatment[it.index()];
        treatment.initiated_treatment = false;
        treatment.retreatment = false;
    }

    pub fn add_withdrawal(&mut self, it: InfectionType) {
        self.treatment[it.index()].num_withdrawals += 1;
    }

    pub fn add_toxic_reaction(&mut self, it: InfectionType) {
        self.treatment[it.index()].num_toxic_reactions += 1;
    }

    pub fn add_completed_treatment(&mut self, it: InfectionType) {
        self.treatment[it.index()].num_completed += 1;
    }

    // Behavior and MOUD

    #[must_use]
    pub fn behavior_details(&self) -> &BehaviorDetails {
        &self.behavior
    }

    #[must_use]
    pub fn behavior(&self) -> Behavior {
        self.behavior.behavior
    }

    /// Nobody returns to `Never`. Starting active use stamps the time last active.
    pub fn set_behavior(&mut self, behavior: Behavior) {
        if behavior == Behavior::Never || behavior == self.behavior.behavior {
            return;
        }
        if behavior.is_active() && !self.behavior.behavior.is_active() {
            self.behavior.time_last_active = self.current_time;
        }
        self.behavior.behavior = behavior;
    }

    #[must_use]
    pub fn is_overdosing(&self) -> bool {
        self.overdosing
    }

    #[must_use]
    pub fn num_overdoses(&self) -> i32 {
        self.num_overdoses
    }

    pub fn toggle_overdose(&mut self) {
        self.overdosing = !self.overdosing;
        if self.overdosing {
            self.num_overdoses += 1;
        }
    }

    #[must_use]
    pub fn moud_details(&self) -> &MOUDDetails {
        &self.moud
    }

    #[must_use]
    pub fn moud(&self) -> MOUD {
        self.moud.moud_state
    }

    pub fn transition_moud(&mut self, state: MOUD) {
        if state == self.moud.moud_state {
            return;
        }
        if state == MOUD::Current {
            self.moud.time_started_moud = self.current_time;
        }
        self.moud.moud_state = state;
        self.moud.current_state_concurrent_months = 0;
    }

    // Pregnancy

    #[must_use]
    pub fn pregnancy_details(&self) -> &PregnancyDetails {
        &self.pregnancy
    }

    #[must_use]
    pub fn pregnancy_state(&self) -> PregnancyState {
        self.pregnancy.pregnancy_state
    }

    pub fn set_pregnancy_state(&mut self, state: PregnancyState) {
        self.pregnancy.pregnancy_state = state;
        self.pregnancy.time_of_pregnancy_change = self.current_time;
    }

    pub fn impregnate(&mut self) {
        if self.sex != Sex::Female {
            return;
        }
        self.pregnancy.count += 1;
        self.set_pregnancy_state(PregnancyState::Pregnant);
    }

    pub fn stillbirth(&mut self) {
        self.pregnancy.num_miscarriages += 1;
        self.set_pregnancy_state(PregnancyState::RestrictedPostpartum);
    }

    pub fn add_infant_exposure(&mut self) {
        self.pregnancy.num_infant_hcv_exposures += 1;
    }

    pub fn birth(&mut self, child: Child) {
        self.pregnancy.num_infants += 1;
        if child.hcv != HCV::None {
            self.pregnancy.num_infant_hcv_infections += 1;
        }
        if child.tested {
            self.pregnancy.num_infant_hcv_tests += 1;
        }
        self.pregnancy.children.push(child);
        self.set_pregnancy_state(PregnancyState::RestrictedPostpartum);
    }

    pub fn end_postpartum(&mut self) {
        self.set_pregnancy_state(PregnancyState::None);
    }

    // Accrual

    pub fn add_cost(&mut self, base: f64, discounted: f64, category: CostCategory) {
        self.costs.add(base, discounted, category);
    }

    #[must_use]
    pub fn costs(&self) -> &CostTracker {
        &self.costs
    }

    /// `(base, discounted)` over every category.
    #[must_use]
    pub fn cost_totals(&self) -> (f64, f64) {
        self.costs.total()
    }

    pub fn set_utility(&mut self, value: f64, category: UtilityCategory) {
        self.utilities.set(value, category);
    }

    #[must_use]
    pub fn utility(&self, category: UtilityCategory) -> f64 {
        self.utilities.get(category)
    }

    #[must_use]
    pub fn current_utilities(&self) -> (f64, f64) {
        self.utilities.current()
    }

    #[must_use]
    pub fn lifetime_utility(&self) -> LifetimeUtility {
        self.lifetime_utility
    }

    /// Adds this month's utilities, undiscounted and discounted at `rate`, to the lifetime
    /// totals.
    ///
    /// # Errors
    /// Propagates a `DomainError` from discounting with a negative rate.
    pub fn accumulate_total_utility(&mut self, rate: f64) -> Result<(), HepceError> {
        let (min, mult) = self.current_utilities();
        let lifetime = &mut self.lifetime_utility;
        lifetime.min_util += min;
        lifetime.mult_util += mult;
        lifetime.discount_min_util += discount(min, rate, self.current_time, false)?;
        lifetime.discount_mult_util += discount(mult, rate, self.current_time, false)?;
        Ok(())
    }

    #[must_use]
    pub fn life_span(&self) -> i32 {
        self.life_span
    }

    #[must_use]
    pub fn discounted_life_span(&self) -> f64 {
        self.discounted_life_span
    }

    pub fn add_discounted_life_span(&mut self, value: f64) {
        self.discounted_life_span += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::numeric::ACC;

    #[test]
    fn id_allocator_is_sequential() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(Person::new(ids.next_id()).id(), 2);
    }

    #[test]
    fn grow_updates_counters() {
        let mut person = Person::new(0);
        person.set_age(300);
        person.set_behavior(Behavior::Injection);
        person.transition_moud(MOUD::Current);
        person.infect_hiv();
        person.set_hiv(HIV::LoUn);
        person.grow();
        assert_eq!(person.age(), 301);
        assert_eq!(person.life_span(), 1);
        assert_eq!(person.current_time(), 1);
        assert_eq!(person.behavior_details().time_last_active, 1);
        assert_eq!(person.moud_details().total_moud_months, 1);
        assert_eq!(person.moud_details().current_state_concurrent_months, 1);
        assert_eq!(person.hiv_details().low_cd4_months_count, 1);
    }

    #[test]
    fn time_since_unset_stamp() {
        let mut person = Person::new(0);
        person.update_timers();
        person.update_timers();
        assert_eq!(person.time_since(-1), 3);
        assert_eq!(person.time_since(person.current_time()), 0);
    }

    #[test]
    fn infect_hcv_is_idempotent() {
        let mut person = Person::new(0);
        person.infect_hcv();
        assert_eq!(person.hcv(), HCV::Acute);
        assert_eq!(person.fibrosis_state(), FibrosisState::F0);
        assert!(person.hcv_details().seropositive);
        person.update_true_fibrosis(FibrosisState::F2);
        person.set_hcv(HCV::Chronic);
        let before = person.hcv_details().clone();
        person.update_timers();
        person.infect_hcv();
        assert_eq!(person.hcv_details(), &before);
    }

    #[test]
    fn reinfection_keeps_fibrosis() {
        let mut person = Person::new(0);
        person.infect_hcv();
        person.update_true_fibrosis(FibrosisState::F3);
        person.clear_hcv(true);
        assert_eq!(person.hcv(), HCV::None);
        assert_eq!(person.hcv_details().times_acute_cleared, 1);
        person.infect_hcv();
        assert_eq!(person.fibrosis_state(), FibrosisState::F3);
        assert_eq!(person.hcv_details().times_infected, 2);
    }

    #[test]
    fn infect_hiv_enters_high_unsuppressed_once() {
        let mut person = Person::new(0);
        person.infect_hiv();
        assert_eq!(person.hiv(), HIV::HiUn);
        person.set_hiv(HIV::LoSu);
        person.infect_hiv();
        assert_eq!(person.hiv(), HIV::LoSu);
    }

    #[test]
    fn treatment_initiation_sequence() {
        let it = InfectionType::Hcv;
        let mut person = Person::new(0);
        person.initiate_treatment(it);
        let details = person.treatment_details(it);
        assert!(details.initiated_treatment && !details.retreatment);
        assert_eq!(details.num_starts, 1);

        person.update_timers();
        person.initiate_treatment(it);
        let details = person.treatment_details(it);
        assert!(details.retreatment);
        assert_eq!(details.num_retreatments, 1);
        assert_eq!(details.num_starts, 2);
        assert_eq!(details.time_of_treatment_initiation, 1);

        person.update_timers();
        person.initiate_treatment(it);
        assert_eq!(person.treatment_details(it).num_starts, 2);
        assert_eq!(person.treatment_details(it).time_of_treatment_initiation, 1);

        person.end_treatment(it);
        let details = person.treatment_details(it);
        assert!(!details.initiated_treatment && !details.retreatment);
    }

    #[test]
    fn linkage_transitions() {
        let it = InfectionType::Hiv;
        let mut person = Person::new(0);
        assert_eq!(person.linkage_state(it), LinkageState::Never);
        person.link(LinkageType::Intervention, it);
        person.update_timers();
        person.unlink(it);
        person.link(LinkageType::Background, it);
        let linkage = person.linkage_details(it);
        assert_eq!(linkage.link_state, LinkageState::Linked);
        assert_eq!(linkage.link_type, LinkageType::Background);
        assert_eq!(linkage.link_count, 2);
        assert_eq!(linkage.time_link_change, 1);
        assert_eq!(
            person.linkage_state(InfectionType::Hcv),
            LinkageState::Never
        );
    }

    #[test]
    fn screening_bookkeeping() {
        let it = InfectionType::Hcv;
        let mut person = Person::new(0);
        person.update_timers();
        person.add_ab_screen(it);
        person.add_rna_screen(it);
        person.diagnose(it);
        let screening = person.screening_details(it);
        assert_eq!(screening.num_ab_tests, 1);
        assert_eq!(screening.num_rna_tests, 1);
        assert_eq!(screening.time_of_last_screening, 1);
        assert!(screening.identified && screening.ab_positive);
        person.clear_diagnosis(it);
        assert!(!person.is_identified(it));
        assert!(person.screening_details(it).ab_positive);
    }

    #[test]
    fn behavior_rules() {
        let mut person = Person::new(0);
        person.update_timers();
        person.set_behavior(Behavior::Noninjection);
        assert_eq!(person.behavior_details().time_last_active, 1);
        person.update_timers();
        person.set_behavior(Behavior::FormerNoninjection);
        person.set_behavior(Behavior::Never);
        assert_eq!(person.behavior(), Behavior::FormerNoninjection);
        // Still active when the second month began.
        assert_eq!(person.behavior_details().time_last_active, 2);
    }

    #[test]
    fn overdose_toggle_counts_onsets() {
        let mut person = Person::new(0);
        person.toggle_overdose();
        person.toggle_overdose();
        person.toggle_overdose();
        assert!(person.is_overdosing());
        assert_eq!(person.num_overdoses(), 2);
    }

    #[test]
    fn moud_transition_resets_month_counter() {
        let mut person = Person::new(0);
        person.update_timers();
        person.transition_moud(MOUD::Current);
        assert_eq!(person.moud_details().time_started_moud, 1);
        assert_eq!(person.moud_details().current_state_concurrent_months, 0);
        person.update_timers();
        person.transition_moud(MOUD::Current);
        assert_eq!(person.moud_details().current_state_concurrent_months, 1);
    }

    #[test]
    fn pregnancy_is_female_only() {
        let mut person = Person::new(0);
        person.impregnate();
        assert_eq!(person.pregnancy_state(), PregnancyState::Na);
        person.set_sex(Sex::Female);
        person.impregnate();
        assert_eq!(person.pregnancy_state(), PregnancyState::Pregnant);
        person.birth(Child {
            hcv: HCV::Chronic,
            tested: true,
        });
        person.birth(Child {
            hcv: HCV::None,
            tested: false,
        });
        let pregnancy = person.pregnancy_details();
        assert_eq!(pregnancy.count, 1);
        assert_eq!(pregnancy.num_infants, 2);
        assert_eq!(pregnancy.num_infant_hcv_infections, 1);
        assert_eq!(pregnancy.num_infant_hcv_tests, 1);
        assert_eq!(pregnancy.children.len(), 2);
        assert_eq!(
            pregnancy.pregnancy_state,
            PregnancyState::RestrictedPostpartum
        );
    }

    #[test]
    fn utilities_min_and_product() {
        let mut person = Person::new(0);
        assert_eq!(person.current_utilities(), (1.0, 1.0));
        person.set_utility(0.5, UtilityCategory::Liver);
        person.set_utility(0.8, UtilityCategory::Behavior);
        let (min, mult) = person.current_utilities();
        assert_almost_eq!(min, 0.5, ACC);
        assert_almost_eq!(mult, 0.4, ACC);
        person.set_utility(0.0, UtilityCategory::Hiv);
        assert_eq!(person.current_utilities(), (0.0, 0.0));
    }

    #[test]
    fn lifetime_utility_discounting() {
        let mut person = Person::new(0);
        person.set_utility(0.5, UtilityCategory::Background);
        person.update_timers();
        person.accumulate_total_utility(0.025).unwrap();
        let lifetime = person.lifetime_utility();
        assert_almost_eq!(lifetime.min_util, 0.5, ACC);
        assert_almost_eq!(lifetime.discount_min_util, 0.5 / 1.025, ACC);
        assert!(person.accumulate_total_utility(-1.0).is_err());
    }

    #[test]
    fn cost_tracking_per_category() {
        let mut person = Person::new(0);
        person.add_cost(10.0, 9.0, CostCategory::Screening);
        person.add_cost(5.0, 4.0, CostCategory::Screening);
        person.add_cost(1.0, 1.0, CostCategory::Liver);
        assert_eq!(person.costs().get(CostCategory::Screening), (15.0, 13.0));
        assert_eq!(person.cost_totals(), (16.0, 14.0));
    }

    #[test]
    fn death_is_recorded() {
        let mut person = Person::new(0);
        person.die(DeathReason::Liver);
        assert!(!person.is_alive());
        assert_eq!(person.death_reason(), DeathReason::Liver);
    }
}
