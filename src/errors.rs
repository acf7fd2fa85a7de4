use thiserror::Error;

/// Failure classes for the campaign engine. Provider errors are caught at
/// per-pair or per-candidate granularity by the scheduler; persistence
/// errors are the one class that must never be silently swallowed.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("invalid campaign config: {0}")]
    ConfigValidation(String),

    #[error("no directory provider configured")]
    ProviderConfiguration,

    #[error("directory provider '{provider}' failed: {message}")]
    DiscoveryProvider { provider: String, message: String },

    #[error("delivery provider error: {0}")]
    DeliveryProvider(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("a campaign batch is already running")]
    BatchAlreadyRunning,
}

pub type CampaignResult<T> = std::result::Result<T, CampaignError>;

impl From<rusqlite::Error> for CampaignError {
    fn from(err: rusqlite::Error) -> Self {
        CampaignError::Persistence(err.to_string())
    }
}

impl From<mobc::Error<rusqlite::Error>> for CampaignError {
    fn from(err: mobc::Error<rusqlite::Error>) -> Self {
        CampaignError::Persistence(err.to_string())
    }
}
