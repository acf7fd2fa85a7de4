use crate::database::DbPool;
use crate::errors::{CampaignError, CampaignResult};
use crate::models::parse_ts;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

/// Decides whether a discovered business may be contacted. A business is
/// ineligible while `now < cooldown_until` on its most recent outreach
/// record; once the cooldown has elapsed it becomes contactable again.
pub struct CooldownFilter {
    pool: DbPool,
}

impl CooldownFilter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn is_eligible(&self, email: &str) -> CampaignResult<bool> {
        let conn = self.pool.get().await?;

        let cooldown_until: Option<String> = conn
            .query_row(
                "SELECT cooldown_until FROM outreach_log WHERE business_email = ?1 \
                 ORDER BY date_contacted DESC LIMIT 1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        match cooldown_until {
            None => Ok(true),
            Some(raw) => {
                let until = parse_ts(&raw).ok_or_else(|| {
                    CampaignError::Persistence(format!("unparseable cooldown_until: {}", raw))
                })?;
                let eligible = Utc::now() >= until;
                if !eligible {
                    debug!("{} is in cooldown until {}", email, raw);
                }
                Ok(eligible)
            }
        }
    }
}
