//! Infection-specific behavior of the shared screening, linking and treatment events.
use crate::config::ConfigSource;
use crate::person::Person;
use crate::types::{CostCategory, InfectionType, UtilityCategory, HCV, HIV};

/// Selects which infection a shared event acts on, and everything that differs between the two:
/// configuration prefixes, table names, cost categories and what counts as truly infected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfectionPolicy {
    infection_type: InfectionType,
}

impl InfectionPolicy {
    pub const HCV: InfectionPolicy = InfectionPolicy {
        infection_type: InfectionType::Hcv,
    };
    pub const HIV: InfectionPolicy = InfectionPolicy {
        infection_type: InfectionType::Hiv,
    };

    #[must_use]
    pub fn infection_type(self) -> InfectionType {
        self.infection_type
    }

    /// Prefix of configuration sections and table names.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self.infection_type {
            InfectionType::Hcv => "",
            InfectionType::Hiv => "hiv_",
        }
    }

    /// `key` under this infection's prefix, e.g. `screening.period` or `hiv_screening.period`.
    #[must_use]
    pub fn key(self, key: &str) -> String {
        format!("{}{key}", self.prefix())
    }

    #[must_use]
    pub fn is_infected(self, person: &Person) -> bool {
        match self.infection_type {
            InfectionType::Hcv => person.hcv() != HCV::None,
            InfectionType::Hiv => person.hiv() != HIV::None,
        }
    }

    /// A diagnosed person whose true status is uninfected.
    #[must_use]
    pub fn is_false_positive(self, person: &Person) -> bool {
        !self.is_infected(person)
    }

    /// Infection stage used to pick a test's sensitivity. HIV has no acute phase, so any HIV
    /// infection screens as chronic.
    #[must_use]
    pub fn screening_stage(self, person: &Person) -> HCV {
        match self.infection_type {
            InfectionType::Hcv => person.hcv(),
            InfectionType::Hiv if person.hiv() == HIV::None => HCV::None,
            InfectionType::Hiv => HCV::Chronic,
        }
    }

    #[must_use]
    pub fn screening_cost_category(self) -> CostCategory {
        match self.infection_type {
            InfectionType::Hcv => CostCategory::Screening,
            InfectionType::Hiv => CostCategory::Hiv,
        }
    }

    #[must_use]
    pub fn linking_cost_category(self) -> CostCategory {
        match self.infection_type {
            InfectionType::Hcv => CostCategory::Linking,
            InfectionType::Hiv => CostCategory::Hiv,
        }
    }

    #[must_use]
    pub fn treatment_categories(self) -> (CostCategory, UtilityCategory) {
        match self.infection_type {
            InfectionType::Hcv => (CostCategory::Treatment, UtilityCategory::Treatment),
            InfectionType::Hiv => (CostCategory::Hiv, UtilityCategory::Hiv),
        }
    }

    /// A view of `config` in which `treatment.x` first resolves to this infection's
    /// `<prefix>treatment.x` and otherwise to the shared key.
    #[must_use]
    pub fn with_fallback<'a>(self, config: &'a dyn ConfigSource) -> PrefixedConfig<'a> {
        PrefixedConfig {
            inner: config,
            prefix: self.prefix(),
        }
    }
}

/// See [`InfectionPolicy::with_fallback`].
pub struct PrefixedConfig<'a> {
    inner: &'a dyn ConfigSource,
    prefix: &'static str,
}

impl ConfigSource for PrefixedConfig<'_> {
    fn get_from_config(&self, key: &str) -> Option<String> {
        if self.prefix.is_empty() {
            return self.inner.get_from_config(key);
        }
        self.inner
            .get_from_config(&format!("{}{key}", self.prefix))
            .or_else(|| self.inner.get_from_config(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigSourceExt};

    #[test]
    fn prefixes() {
        assert_eq!(
            InfectionPolicy::HCV.key("linking.intervention_cost"),
            "linking.intervention_cost"
        );
        assert_eq!(
            InfectionPolicy::HIV.key("screening_and_linkage"),
            "hiv_screening_and_linkage"
        );
    }

    #[test]
    fn hiv_treatment_keys_fall_back() {
        let config = Config::new()
            .with("treatment.treatment_cost", 10)
            .with("treatment.tox_cost", 5)
            .with("hiv_treatment.treatment_cost", 99);
        let hiv = InfectionPolicy::HIV.with_fallback(&config);
        assert_eq!(hiv.get_int("treatment.treatment_cost"), 99);
        assert_eq!(hiv.get_int("treatment.tox_cost"), 5);
        let hcv = InfectionPolicy::HCV.with_fallback(&config);
        assert_eq!(hcv.get_int("treatment.treatment_cost"), 10);
    }

    #[test]
    fn hiv_screens_as_chronic() {
        let mut person = Person::new(0);
        assert_eq!(InfectionPolicy::HIV.screening_stage(&person), HCV::None);
        assert!(InfectionPolicy::HIV.is_false_positive(&person));
        person.infect_hiv();
        assert_eq!(InfectionPolicy::HIV.screening_stage(&person), HCV::Chronic);
        assert!(!InfectionPolicy::HCV.is_infected(&person));
        person.infect_hcv();
        assert_eq!(InfectionPolicy::HCV.screening_stage(&person), HCV::Acute);
    }
}
