use crate::{error::VicinityError, search::SearchConfig};

/// Comma-separated radius increments in kilometers, e.g. `1,5,10,25`.
pub const STEPS_ENV_VAR: &str = "VICINITY_RADIUS_STEPS_KM";
/// Fallback radius in kilometers for requests whose radius cannot be read.
pub const DEFAULT_RADIUS_ENV_VAR: &str = "VICINITY_DEFAULT_RADIUS_KM";

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Start from defaults, overridden by `VICINITY_RADIUS_STEPS_KM` and
    /// `VICINITY_DEFAULT_RADIUS_KM` when set.
    pub fn from_env() -> Result<Self, VicinityError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`SearchConfigBuilder::from_env`], reading variables through `lookup`.
    pub fn from_vars<F>(lookup: F) -> Result<Self, VicinityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();
        if let Some(steps) = lookup(STEPS_ENV_VAR) {
            builder.config.steps_km = parse_steps(&steps)?;
        }
        if let Some(radius) = lookup(DEFAULT_RADIUS_ENV_VAR) {
            builder.config.default_radius_km = radius.trim().parse().map_err(|_| {
                VicinityError::ConfigError(format!(
                    "{DEFAULT_RADIUS_ENV_VAR} must be a non-negative integer, got '{radius}'"
                ))
            })?;
        }
        Ok(builder)
    }

    /// Set the radius increments tried when widening a search
    pub fn steps_km(mut self, steps: impl IntoIterator<Item = u32>) -> Self {
        self.config.steps_km = steps.into_iter().collect();
        self
    }

    /// Set the radius used when a request's radius is missing or unreadable
    pub fn default_radius_km(mut self, radius_km: u32) -> Self {
        self.config.default_radius_km = radius_km;
        self
    }

    /// Enable or disable re-checking attribute results against the requested locality
    pub fn post_filter_attributes(mut self, enabled: bool) -> Self {
        self.config.post_filter_attributes = enabled;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<SearchConfig, VicinityError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl SearchConfig {
    /// Check the invariants [`SearchConfigBuilder::build`] enforces, for
    /// configurations assembled field by field.
    pub fn validate(&self) -> Result<(), VicinityError> {
        if self.steps_km.is_empty() {
            return Err(VicinityError::ConfigError(
                "At least one radius step is required".to_string(),
            ));
        }
        if self.steps_km.contains(&0) {
            return Err(VicinityError::ConfigError(format!(
                "Radius steps must be positive, got {:?}",
                self.steps_km
            )));
        }
        Ok(())
    }
}

fn parse_steps(raw: &str) -> Result<Vec<u32>, VicinityError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>().map_err(|_| {
                VicinityError::ConfigError(format!(
                    "{STEPS_ENV_VAR} must list positive integers, got '{s}'"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{DEFAULT_RADIUS_KM, DEFAULT_RADIUS_STEPS_KM};

    #[test]
    fn test_defaults() {
        let config = SearchConfigBuilder::new().build().unwrap();
        assert_eq!(config.steps_km, DEFAULT_RADIUS_STEPS_KM.to_vec());
        assert_eq!(config.default_radius_km, DEFAULT_RADIUS_KM);
        assert!(config.post_filter_attributes);
    }

    #[test]
    fn test_builder_overrides() {
        let config = SearchConfigBuilder::new()
            .steps_km([2, 4])
            .default_radius_km(3)
            .post_filter_attributes(false)
            .build()
            .unwrap();
        assert_eq!(config.steps_km, vec![2, 4]);
        assert_eq!(config.default_radius_km, 3);
        assert!(!config.post_filter_attributes);
    }

    #[test]
    fn test_rejects_empty_or_zero_steps() {
        assert!(matches!(
            SearchConfigBuilder::new().steps_km(Vec::new()).build(),
            Err(VicinityError::ConfigError(_))
        ));
        assert!(matches!(
            SearchConfigBuilder::new().steps_km([1, 0, 5]).build(),
            Err(VicinityError::ConfigError(_))
        ));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_from_vars_reads_both_variables() {
        let config = SearchConfigBuilder::from_vars(vars(&[
            (STEPS_ENV_VAR, "2, 20,200"),
            (DEFAULT_RADIUS_ENV_VAR, " 7 "),
        ]))
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(config.steps_km, vec![2, 20, 200]);
        assert_eq!(config.default_radius_km, 7);
    }

    #[test]
    fn test_from_vars_unset_keeps_defaults() {
        let config = SearchConfigBuilder::from_vars(vars(&[])).unwrap().build().unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_from_vars_rejects_bad_values() {
        assert!(matches!(
            SearchConfigBuilder::from_vars(vars(&[(DEFAULT_RADIUS_ENV_VAR, "-3")])),
            Err(VicinityError::ConfigError(_))
        ));
        assert!(matches!(
            SearchConfigBuilder::from_vars(vars(&[(DEFAULT_RADIUS_ENV_VAR, "one")])),
            Err(VicinityError::ConfigError(_))
        ));
        assert!(matches!(
            SearchConfigBuilder::from_vars(vars(&[(STEPS_ENV_VAR, "1,x")])),
            Err(VicinityError::ConfigError(_))
        ));
        // parses, but fails validation once built
        let builder = SearchConfigBuilder::from_vars(vars(&[(STEPS_ENV_VAR, "0,5")])).unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_hand_built_config_validation() {
        let config = SearchConfig {
            steps_km: Vec::new(),
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_steps() {
        assert_eq!(parse_steps("1, 5,10 ,").unwrap(), vec![1, 5, 10]);
        assert!(parse_steps("1,five").is_err());
        assert!(parse_steps("-1").is_err());
    }
}
