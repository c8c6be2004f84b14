//! Configuration for the plan estimator

use core_config::server::ServerConfig;
use core_config::{ConfigError, Environment, FromEnv, env_or_default, env_parse};
use domain_estimator::catalog::{AZURE_PRICING_API, AZURE_PRICING_API_VERSION};
use domain_estimator::{AzureRetailCatalogConfig, EstimatorSettings};
use std::time::Duration;

/// Largest plan document accepted over HTTP, in bytes
const DEFAULT_MAX_PLAN_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub catalog: AzureRetailCatalogConfig,
    pub estimator: EstimatorSettings,
    pub max_plan_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog_defaults = AzureRetailCatalogConfig::default();
        let estimator_defaults = EstimatorSettings::default();

        let catalog = AzureRetailCatalogConfig {
            base_url: env_or_default("AZURE_PRICING_API_URL", AZURE_PRICING_API),
            api_version: env_or_default("AZURE_PRICING_API_VERSION", AZURE_PRICING_API_VERSION),
            request_timeout: Duration::from_secs(env_parse(
                "CATALOG_REQUEST_TIMEOUT_SECS",
                catalog_defaults.request_timeout.as_secs(),
            )?),
            max_pages: positive("CATALOG_MAX_PAGES", catalog_defaults.max_pages)?,
        };

        let estimator = EstimatorSettings {
            concurrency: positive("CATALOG_CONCURRENCY", estimator_defaults.concurrency)?,
            deadline: Duration::from_secs(env_parse(
                "ESTIMATE_DEADLINE_SECS",
                estimator_defaults.deadline.as_secs(),
            )?),
        };

        Ok(Config {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            catalog,
            estimator,
            max_plan_bytes: env_parse("MAX_PLAN_BYTES", DEFAULT_MAX_PLAN_BYTES)?,
        })
    }
}

fn positive(key: &str, default: usize) -> Result<usize, ConfigError> {
    match env_parse(key, default)? {
        0 => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            details: "must be at least 1".to_string(),
        }),
        value => Ok(value),
    }
}
