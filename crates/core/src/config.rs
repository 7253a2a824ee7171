use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `AUDIENCE_EXPRESS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Rollout toggles for in-progress product surfaces.
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesConfig {
    /// Serialize cohorts with the criteria-tree encoding instead of the
    /// legacy flat-groups encoding.
    #[serde(default = "default_criteria_filters")]
    pub criteria_filters: bool,
}

fn default_criteria_filters() -> bool {
    false
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            criteria_filters: default_criteria_filters(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            features: FeaturesConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("AUDIENCE_EXPRESS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
