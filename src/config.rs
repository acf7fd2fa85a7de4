use crate::errors::{CampaignError, CampaignResult};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Top-level engine configuration, loaded from config.yml with a usable
/// default fallback. Secrets (provider API keys) come from the environment,
/// never from this file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub campaign: CampaignConfig,
    pub schedule: ScheduleConfig,
    pub discovery: DiscoveryConfig,
    pub categories: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    pub enabled: bool,
    /// Local wall-clock hour (0-23) at which the daily batch fires.
    pub run_hour: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Cap on discovered businesses returned per (category, location) pair.
    pub results_per_pair: usize,
    /// Base URL of the comparison site, used for unsubscribe and CTA links.
    pub site_base_url: String,
}

/// Mutable campaign tunables. All fields must be positive and
/// `daily_batch_size` must never exceed `max_daily_emails`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CampaignConfig {
    pub daily_batch_size: u32,
    pub max_daily_emails: u32,
    pub categories_per_day: usize,
    pub locations_per_day: usize,
    pub delay_between_emails_ms: u64,
    pub cooldown_days: u32,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Preset::Moderate.config()
    }
}

impl CampaignConfig {
    // delay_between_emails_ms may be zero: it disables pacing, which the
    // batch tests rely on. Everything else must be positive.
    pub fn validate(&self) -> CampaignResult<()> {
        if self.daily_batch_size == 0
            || self.max_daily_emails == 0
            || self.categories_per_day == 0
            || self.locations_per_day == 0
            || self.cooldown_days == 0
        {
            return Err(CampaignError::ConfigValidation(
                "all campaign tunables must be positive".to_string(),
            ));
        }
        if self.daily_batch_size > self.max_daily_emails {
            return Err(CampaignError::ConfigValidation(format!(
                "daily_batch_size ({}) must not exceed max_daily_emails ({})",
                self.daily_batch_size, self.max_daily_emails
            )));
        }
        Ok(())
    }
}

/// Partial update applied over the current config; absent fields keep
/// their current value.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct CampaignConfigUpdate {
    pub daily_batch_size: Option<u32>,
    pub max_daily_emails: Option<u32>,
    pub categories_per_day: Option<usize>,
    pub locations_per_day: Option<usize>,
    pub delay_between_emails_ms: Option<u64>,
    pub cooldown_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Conservative,
    Moderate,
    Aggressive,
}

impl Preset {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "conservative" => Some(Preset::Conservative),
            "moderate" => Some(Preset::Moderate),
            "aggressive" => Some(Preset::Aggressive),
            _ => None,
        }
    }

    pub fn config(&self) -> CampaignConfig {
        match self {
            Preset::Conservative => CampaignConfig {
                daily_batch_size: 25,
                max_daily_emails: 50,
                categories_per_day: 2,
                locations_per_day: 2,
                delay_between_emails_ms: 3000,
                cooldown_days: 30,
            },
            Preset::Moderate => CampaignConfig {
                daily_batch_size: 75,
                max_daily_emails: 150,
                categories_per_day: 3,
                locations_per_day: 3,
                delay_between_emails_ms: 2000,
                cooldown_days: 30,
            },
            Preset::Aggressive => CampaignConfig {
                daily_batch_size: 150,
                max_daily_emails: 300,
                categories_per_day: 4,
                locations_per_day: 4,
                delay_between_emails_ms: 1000,
                cooldown_days: 30,
            },
        }
    }
}

/// Holds the live campaign tunables. Readers always get a copy, so nothing
/// outside the guarded setters can mutate shared state; every successful
/// update is visible to the next scheduler run.
#[derive(Debug)]
pub struct ConfigStore {
    inner: RwLock<CampaignConfig>,
}

impl ConfigStore {
    pub fn new(config: CampaignConfig) -> CampaignResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: RwLock::new(config),
        })
    }

    pub fn get(&self) -> CampaignConfig {
        *self.inner.read().expect("config lock poisoned")
    }

    /// Applies a partial update. The store is left unchanged when the
    /// resulting config fails validation.
    pub fn update(&self, update: CampaignConfigUpdate) -> CampaignResult<CampaignConfig> {
        let mut guard = self.inner.write().expect("config lock poisoned");
        let mut next = *guard;
        if let Some(v) = update.daily_batch_size {
            next.daily_batch_size = v;
        }
        if let Some(v) = update.max_daily_emails {
            next.max_daily_emails = v;
        }
        if let Some(v) = update.categories_per_day {
            next.categories_per_day = v;
        }
        if let Some(v) = update.locations_per_day {
            next.locations_per_day = v;
        }
        if let Some(v) = update.delay_between_emails_ms {
            next.delay_between_emails_ms = v;
        }
        if let Some(v) = update.cooldown_days {
            next.cooldown_days = v;
        }
        next.validate()?;
        *guard = next;
        Ok(next)
    }

    pub fn apply_preset(&self, preset: Preset) -> CampaignConfig {
        let config = preset.config();
        *self.inner.write().expect("config lock poisoned") = config;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            database: DatabaseConfig {
                path: "data/outreach.db".to_string(),
            },
            campaign: CampaignConfig::default(),
            schedule: ScheduleConfig {
                enabled: true,
                run_hour: 9,
            },
            discovery: DiscoveryConfig {
                results_per_pair: 4,
                site_base_url: "https://www.pricefair.co.uk".to_string(),
            },
            categories: vec![
                "kitchen".to_string(),
                "bathroom".to_string(),
                "windows".to_string(),
                "boiler".to_string(),
                "flooring".to_string(),
                "driveways".to_string(),
                "garage doors".to_string(),
                "loft conversion".to_string(),
                "solar panels".to_string(),
                "artificial grass".to_string(),
            ],
            locations: vec![
                "Manchester".to_string(),
                "Leeds".to_string(),
                "Birmingham".to_string(),
                "Liverpool".to_string(),
                "Sheffield".to_string(),
                "Bristol".to_string(),
                "Newcastle".to_string(),
                "Nottingham".to_string(),
                "Leicester".to_string(),
                "Glasgow".to_string(),
            ],
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    config.campaign.validate()?;
    Ok(config)
}
