use serde::{Deserialize, Serialize};

/// One selectable value in a dropdown, as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

/// Static reference data for the stage/flow/result enumerations.
/// Fetched from the backend; immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownConfig {
    pub stages: Vec<DropdownOption>,
    pub flows: Vec<DropdownOption>,
    pub results: Vec<DropdownOption>,
}

impl DropdownConfig {
    fn contains(options: &[DropdownOption], value: &str) -> bool {
        options.iter().any(|option| option.value == value)
    }

    pub fn is_valid_stage(&self, value: &str) -> bool {
        Self::contains(&self.stages, value)
    }

    pub fn is_valid_flow(&self, value: &str) -> bool {
        Self::contains(&self.flows, value)
    }

    pub fn is_valid_result(&self, value: &str) -> bool {
        Self::contains(&self.results, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(value: &str) -> DropdownOption {
        DropdownOption {
            value: value.to_string(),
            label: value.to_uppercase(),
        }
    }

    #[test]
    fn validates_values_against_option_sets() {
        let config = DropdownConfig {
            stages: vec![option("build"), option("deploy")],
            flows: vec![option("ci")],
            results: vec![option("pass"), option("fail")],
        };
        assert!(config.is_valid_stage("build"));
        assert!(!config.is_valid_stage("test"));
        assert!(config.is_valid_flow("ci"));
        assert!(config.is_valid_result("fail"));
        assert!(!config.is_valid_result("flaky"));
    }
}
