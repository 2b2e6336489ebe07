//! Integer-coded states and the per-person detail records.
//!
//! Every enum carries the integer code used as a stratified-table key component and in the
//! population CSV (`code()` / `from_code()`), and parses from the lowercase names used in
//! configuration lists (`"f4"`, `"injection"`, `"year-one-postpartum"`, ...).

use strum::{Display, EnumCount, EnumIter, EnumString, FromRepr};

macro_rules! integer_coded {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                /// The integer code of this state.
                #[must_use]
                pub fn code(self) -> i32 {
                    self as i32
                }

                /// Looks up a state by its integer code.
                #[must_use]
                pub fn from_code(code: i32) -> Option<Self> {
                    Self::from_repr(code)
                }
            }
        )+
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum InfectionType {
    #[strum(serialize = "hcv")]
    Hcv = 0,
    #[strum(serialize = "hiv")]
    Hiv = 1,
}

impl InfectionType {
    /// Successor in declaration order; the last type maps to itself.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            InfectionType::Hcv => InfectionType::Hiv,
            InfectionType::Hiv => InfectionType::Hiv,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum HCV {
    #[default]
    #[strum(serialize = "none")]
    None = 0,
    #[strum(serialize = "acute")]
    Acute = 1,
    #[strum(serialize = "chronic")]
    Chronic = 2,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum HIV {
    #[default]
    #[strum(serialize = "none")]
    None = 0,
    /// High CD4 count, unsuppressed
    #[strum(serialize = "hi-un")]
    HiUn = 1,
    /// High CD4 count, suppressed
    #[strum(serialize = "hi-su")]
    HiSu = 2,
    /// Low CD4 count, unsuppressed
    #[strum(serialize = "lo-un")]
    LoUn = 3,
    /// Low CD4 count, suppressed
    #[strum(serialize = "lo-su")]
    LoSu = 4,
}

impl HIV {
    #[must_use]
    pub fn is_low_cd4(self) -> bool {
        matches!(self, HIV::LoUn | HIV::LoSu)
    }

    #[must_use]
    pub fn is_high_cd4(self) -> bool {
        matches!(self, HIV::HiUn | HIV::HiSu)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum DeathReason {
    #[default]
    #[strum(serialize = "na")]
    Na = -1,
    #[strum(serialize = "background")]
    Background = 0,
    #[strum(serialize = "liver")]
    Liver = 1,
    #[strum(serialize = "infection")]
    Infection = 2,
    #[strum(serialize = "age")]
    Age = 3,
    #[strum(serialize = "overdose")]
    Overdose = 4,
    #[strum(serialize = "hiv")]
    Hiv = 5,
}

/// Opioid use classification.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    FromRepr,
)]
#[repr(i32)]
pub enum Behavior {
    #[default]
    #[strum(serialize = "never")]
    Never = 0,
    #[strum(serialize = "former_noninjection")]
    FormerNoninjection = 1,
    #[strum(serialize = "former_injection")]
    FormerInjection = 2,
    #[strum(serialize = "noninjection")]
    Noninjection = 3,
    #[strum(serialize = "injection")]
    Injection = 4,
}

impl Behavior {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Behavior::Noninjection | Behavior::Injection)
    }

    #[must_use]
    pub fn is_former(self) -> bool {
        matches!(self, Behavior::FormerNoninjection | Behavior::FormerInjection)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum LinkageType {
    #[default]
    #[strum(serialize = "na")]
    Na = -1,
    #[strum(serialize = "background")]
    Background = 0,
    #[strum(serialize = "intervention")]
    Intervention = 1,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum LinkageState {
    #[default]
    #[strum(serialize = "never")]
    Never = 0,
    #[strum(serialize = "linked")]
    Linked = 1,
    #[strum(serialize = "unlinked")]
    Unlinked = 2,
}

/// True liver fibrosis stage. `None` means the person has never been infected.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    FromRepr,
)]
#[repr(i32)]
pub enum FibrosisState {
    #[strum(serialize = "f0")]
    F0 = 0,
    #[strum(serialize = "f1")]
    F1 = 1,
    #[strum(serialize = "f2")]
    F2 = 2,
    #[strum(serialize = "f3")]
    F3 = 3,
    #[strum(serialize = "f4")]
    F4 = 4,
    #[strum(serialize = "decomp")]
    Decomp = 5,
    #[default]
    #[strum(serialize = "none")]
    None = 6,
}

impl FibrosisState {
    /// The next stage of liver disease. `Decomp` is absorbing and `None` has no successor.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            FibrosisState::F0 => FibrosisState::F1,
            FibrosisState::F1 => FibrosisState::F2,
            FibrosisState::F2 => FibrosisState::F3,
            FibrosisState::F3 => FibrosisState::F4,
            FibrosisState::F4 | FibrosisState::Decomp => FibrosisState::Decomp,
            FibrosisState::None => FibrosisState::None,
        }
    }

    /// Compensated or decompensated cirrhosis.
    #[must_use]
    pub fn is_cirrhotic(self) -> bool {
        matches!(self, FibrosisState::F4 | FibrosisState::Decomp)
    }
}

/// Clinically staged fibrosis.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    FromRepr,
)]
#[repr(i32)]
pub enum MeasuredFibrosisState {
    #[strum(serialize = "f01")]
    F01 = 0,
    #[strum(serialize = "f23")]
    F23 = 1,
    #[strum(serialize = "f4")]
    F4 = 2,
    #[strum(serialize = "decomp")]
    Decomp = 3,
    #[default]
    #[strum(serialize = "none")]
    None = 4,
}

impl MeasuredFibrosisState {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            MeasuredFibrosisState::F01 => MeasuredFibrosisState::F23,
            MeasuredFibrosisState::F23 => MeasuredFibrosisState::F4,
            MeasuredFibrosisState::F4 | MeasuredFibrosisState::Decomp => {
                MeasuredFibrosisState::Decomp
            }
            MeasuredFibrosisState::None => MeasuredFibrosisState::None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum MOUD {
    #[default]
    #[strum(serialize = "none")]
    None = 0,
    #[strum(serialize = "current")]
    Current = 1,
    #[strum(serialize = "post")]
    Post = 2,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum Sex {
    #[default]
    #[strum(serialize = "male")]
    Male = 0,
    #[strum(serialize = "female")]
    Female = 1,
}

/// `Na` marks a person for whom pregnancy is not modeled.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i32)]
pub enum PregnancyState {
    #[default]
    #[strum(serialize = "na")]
    Na = -1,
    #[strum(serialize = "none")]
    None = 0,
    #[strum(serialize = "pregnant")]
    Pregnant = 1,
    #[strum(serialize = "restricted-postpartum")]
    RestrictedPostpartum = 2,
    #[strum(serialize = "year-one-postpartum")]
    YearOnePostpartum = 3,
    #[strum(serialize = "year-two-postpartum")]
    YearTwoPostpartum = 4,
}

impl PregnancyState {
    #[must_use]
    pub fn is_postpartum(self) -> bool {
        matches!(
            self,
            PregnancyState::RestrictedPostpartum
                | PregnancyState::YearOnePostpartum
                | PregnancyState::YearTwoPostpartum
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, FromRepr)]
#[repr(i32)]
pub enum CostCategory {
    Misc = 0,
    Behavior = 1,
    Screening = 2,
    Linking = 3,
    Staging = 4,
    Liver = 5,
    Treatment = 6,
    Background = 7,
    Hiv = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, FromRepr)]
#[repr(i32)]
pub enum UtilityCategory {
    Behavior = 0,
    Liver = 1,
    Treatment = 2,
    Background = 3,
    Hiv = 4,
}

integer_coded!(
    InfectionType,
    HCV,
    HIV,
    DeathReason,
    Behavior,
    LinkageType,
    LinkageState,
    FibrosisState,
    MeasuredFibrosisState,
    MOUD,
    Sex,
    PregnancyState,
    CostCategory,
    UtilityCategory,
);

#[derive(Debug, Clone, PartialEq)]
pub struct HCVDetails {
    pub hcv: HCV,
    pub fibrosis_state: FibrosisState,
    pub is_genotype_three: bool,
    pub seropositive: bool,
    pub time_changed: i32,
    pub time_fibrosis_state_changed: i32,
    pub times_infected: i32,
    pub times_acute_cleared: i32,
    pub svrs: i32,
}

impl Default for HCVDetails {
    fn default() -> Self {
        HCVDetails {
            hcv: HCV::None,
            fibrosis_state: FibrosisState::None,
            is_genotype_three: false,
            seropositive: false,
            time_changed: -1,
            time_fibrosis_state_changed: -1,
            times_infected: 0,
            times_acute_cleared: 0,
            svrs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HIVDetails {
    pub hiv: HIV,
    pub time_changed: i32,
    pub low_cd4_months_count: i32,
}

impl Default for HIVDetails {
    fn default() -> Self {
        HIVDetails {
            hiv: HIV::None,
            time_changed: -1,
            low_cd4_months_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDetails {
    pub behavior: Behavior,
    pub time_last_active: i32,
}

impl Default for BehaviorDetails {
    fn default() -> Self {
        BehaviorDetails {
            behavior: Behavior::Never,
            time_last_active: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkageDetails {
    pub link_state: LinkageState,
    pub time_link_change: i32,
    pub link_type: LinkageType,
    pub link_count: i32,
}

impl Default for LinkageDetails {
    fn default() -> Self {
        LinkageDetails {
            link_state: LinkageState::Never,
            time_link_change: -1,
            link_type: LinkageType::Na,
            link_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MOUDDetails {
    pub moud_state: MOUD,
    pub time_started_moud: i32,
    pub current_state_concurrent_months: i32,
    pub total_moud_months: i32,
}

impl Default for MOUDDetails {
    fn default() -> Self {
        MOUDDetails {
            moud_state: MOUD::None,
            time_started_moud: -1,
            current_state_concurrent_months: 0,
            total_moud_months: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    pub hcv: HCV,
    pub tested: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PregnancyDetails {
    pub pregnancy_state: PregnancyState,
    pub time_of_pregnancy_change: i32,
    pub count: i32,
    pub num_infants: i32,
    pub num_miscarriages: i32,
    pub num_infant_hcv_exposures: i32,
    pub num_infant_hcv_infections: i32,
    pub num_infant_hcv_tests: i32,
    pub children: Vec<Child>,
}

impl Default for PregnancyDetails {
    fn default() -> Self {
        PregnancyDetails {
            pregnancy_state: PregnancyState::Na,
            time_of_pregnancy_change: -1,
            count: 0,
            num_infants: 0,
            num_miscarriages: 0,
            num_infant_hcv_exposures: 0,
            num_infant_hcv_infections: 0,
            num_infant_hcv_tests: 0,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagingDetails {
    pub measured_fibrosis_state: MeasuredFibrosisState,
    pub had_second_test: bool,
    pub time_of_last_staging: i32,
}

impl Default for StagingDetails {
    fn default() -> Self {
        StagingDetails {
            measured_fibrosis_state: MeasuredFibrosisState::None,
            had_second_test: false,
            time_of_last_staging: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningDetails {
    pub time_of_last_screening: i32,
    pub num_ab_tests: i32,
    pub num_rna_tests: i32,
    pub ab_positive: bool,
    pub identified: bool,
    pub time_identified: i32,
    pub num_false_negatives: i32,
}

impl Default for ScreeningDetails {
    fn default() -> Self {
        ScreeningDetails {
            time_of_last_screening: -1,
            num_ab_tests: 0,
            num_rna_tests: 0,
            ab_positive: false,
            identified: false,
            time_identified: -1,
            num_false_negatives: 0,
        }
    }
}

/// `retreatment` doubles as the salvage flag: it is set when a failed course is followed by a
/// second-line course.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentDetails {
    pub initiated_treatment: bool,
    pub time_of_treatment_initiation: i32,
    pub num_starts: i32,
    pub num_withdrawals: i32,
    pub num_toxic_reactions: i32,
    pub num_completed: i32,
    pub num_retreatments: i32,
    pub retreatment: bool,
}

impl Default for TreatmentDetails {
    fn default() -> Self {
        TreatmentDetails {
            initiated_treatment: false,
            time_of_treatment_initiation: -1,
            num_starts: 0,
            num_withdrawals: 0,
            num_toxic_reactions: 0,
            num_completed: 0,
            num_retreatments: 0,
            retreatment: false,
        }
    }
}

/// Lifetime quality-adjusted time, in the minimum and multiplicative combination forms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LifetimeUtility {
    pub min_util: f64,
    pub mult_util: f64,
    pub discount_min_util: f64,
    pub discount_mult_util: f64,
}

/// A cost/utility pair as stored in the impact tables.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostUtil {
    pub cost: f64,
    pub util: f64,
}
