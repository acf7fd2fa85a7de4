pub mod rotation;

use crate::config::{CampaignConfig, ConfigStore};
use crate::discovery::BusinessDiscovery;
use crate::eligibility::CooldownFilter;
use crate::email_sender::{composer::EmailComposer, DeliverySender};
use crate::errors::{CampaignError, CampaignResult};
use crate::models::{BatchOutcome, BusinessContact, EmailStatus, OutreachType, RunTrigger};
use crate::outreach::OutreachLog;
use chrono::{DateTime, Datelike, Local, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

enum CandidateOutcome {
    Contacted,
    Skipped,
    Failed,
}

/// Drives the daily outreach batch: Discovery -> Eligibility -> Compose/Send
/// -> Log, sequentially and with fixed pacing. One batch at a time; a
/// trigger that arrives while a batch is running is rejected, not queued.
pub struct CampaignScheduler {
    config: Arc<ConfigStore>,
    discovery: BusinessDiscovery,
    composer: EmailComposer,
    sender: Box<dyn DeliverySender>,
    log: OutreachLog,
    eligibility: CooldownFilter,
    categories: Vec<String>,
    locations: Vec<String>,
    running: AtomicBool,
    stop: AtomicBool,
}

impl CampaignScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<ConfigStore>,
        discovery: BusinessDiscovery,
        composer: EmailComposer,
        sender: Box<dyn DeliverySender>,
        log: OutreachLog,
        eligibility: CooldownFilter,
        categories: Vec<String>,
        locations: Vec<String>,
    ) -> Self {
        Self {
            config,
            discovery,
            composer,
            sender,
            log,
            eligibility,
            categories,
            locations,
            running: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cooperative stop, checked between candidates so the current
    /// candidate's log write always completes.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub async fn run_batch(&self, trigger: RunTrigger) -> CampaignResult<BatchOutcome> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CampaignError::BatchAlreadyRunning);
        }
        let result = self.run_batch_inner(trigger).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_batch_inner(&self, trigger: RunTrigger) -> CampaignResult<BatchOutcome> {
        let config = self.config.get();
        self.discovery.ensure_configured()?;

        let day_of_year = Utc::now().ordinal0() as usize;
        let (categories, locations) =
            select_day_slice(&self.categories, &self.locations, day_of_year, &config);

        info!(
            "Starting {} campaign batch: {} categories x {} locations, target {}/{} emails",
            trigger.as_str(),
            categories.len(),
            locations.len(),
            config.daily_batch_size,
            config.max_daily_emails
        );

        let mut outcome = BatchOutcome::default();

        'pairs: for category in &categories {
            for location in &locations {
                if self.stop.load(Ordering::SeqCst) {
                    info!("Stop requested, ending batch early");
                    break 'pairs;
                }
                if batch_limit_reached(&outcome, &config) {
                    break 'pairs;
                }

                // One pair failing must not take the whole run down.
                let candidates = match self.discovery.discover(category, location).await {
                    Ok(candidates) => candidates,
                    Err(e) => {
                        warn!("Discovery failed for ({}, {}): {}", category, location, e);
                        continue;
                    }
                };

                for candidate in &candidates {
                    if self.stop.load(Ordering::SeqCst) {
                        info!("Stop requested, ending batch early");
                        break 'pairs;
                    }
                    if batch_limit_reached(&outcome, &config) {
                        break 'pairs;
                    }

                    match self.process_candidate(candidate, &config).await {
                        CandidateOutcome::Contacted => outcome.contacted += 1,
                        CandidateOutcome::Skipped => outcome.skipped += 1,
                        CandidateOutcome::Failed => outcome.failed += 1,
                    }

                    let delay = pacing_delay_ms(&config);
                    if delay > 0 {
                        tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        info!(
            "Campaign batch complete: {} contacted, {} skipped, {} failed",
            outcome.contacted, outcome.skipped, outcome.failed
        );
        Ok(outcome)
    }

    async fn process_candidate(
        &self,
        contact: &BusinessContact,
        config: &CampaignConfig,
    ) -> CandidateOutcome {
        match self.eligibility.is_eligible(&contact.email).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Skipping {} (cooldown)", contact.email);
                return CandidateOutcome::Skipped;
            }
            Err(e) => {
                error!("Eligibility check failed for {}: {}", contact.email, e);
                return CandidateOutcome::Failed;
            }
        }

        let tracking_id = Uuid::new_v4().to_string();
        let content = self.composer.compose(contact);
        let send_outcome = self.sender.send(contact, &content, &tracking_id).await;

        let status = if send_outcome.success {
            EmailStatus::Sent
        } else {
            EmailStatus::Failed
        };

        // A send without its log record breaks the cooldown and audit
        // guarantees, so this failure is loud and fatal to the candidate.
        if let Err(e) = self
            .log
            .record_attempt(
                contact,
                OutreachType::SystematicDiscovery,
                &contact.category,
                &tracking_id,
                status,
                send_outcome.provider_message_id.as_deref(),
                config.cooldown_days,
            )
            .await
        {
            error!(
                "Failed to record outreach attempt for {}: {}",
                contact.email, e
            );
            return CandidateOutcome::Failed;
        }

        if send_outcome.success {
            info!("📧 Contacted {} ({})", contact.name, contact.email);
            CandidateOutcome::Contacted
        } else {
            warn!(
                "Delivery failed for {}: {}",
                contact.email,
                send_outcome.error.as_deref().unwrap_or("unknown error")
            );
            CandidateOutcome::Failed
        }
    }

    /// Fires the batch once a day at the configured local hour until a stop
    /// is requested.
    pub async fn run_daily(self: Arc<Self>, run_hour: u32) {
        loop {
            let wait = duration_until_next_run(Local::now(), run_hour);
            info!(
                "Next scheduled campaign run in {} minutes",
                wait.as_secs() / 60
            );
            tokio::time::sleep(wait).await;

            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            match self.run_batch(RunTrigger::Scheduled).await {
                Ok(outcome) => info!(
                    "Scheduled run finished: {} contacted, {} skipped, {} failed",
                    outcome.contacted, outcome.skipped, outcome.failed
                ),
                Err(CampaignError::BatchAlreadyRunning) => {
                    warn!("Skipping scheduled run, a batch is already in flight")
                }
                Err(e) => error!("Scheduled campaign run failed: {}", e),
            }
        }
    }
}

fn batch_limit_reached(outcome: &BatchOutcome, config: &CampaignConfig) -> bool {
    outcome.contacted >= config.daily_batch_size || outcome.contacted >= config.max_daily_emails
}

// Base pacing plus a little jitter (never when pacing is disabled).
fn pacing_delay_ms(config: &CampaignConfig) -> u64 {
    let base = config.delay_between_emails_ms;
    if base == 0 {
        return 0;
    }
    base + fastrand::u64(0..=1000)
}

/// Deterministic day slice: same day, config, and lists always produce the
/// same (categories, locations) selection. Both rotations are independent
/// and wrap via modulo, so coverage cycles through the full lists.
pub fn select_day_slice(
    categories: &[String],
    locations: &[String],
    day_of_year: usize,
    config: &CampaignConfig,
) -> (Vec<String>, Vec<String>) {
    (
        rotation::rotate(categories, day_of_year, config.categories_per_day),
        rotation::rotate(locations, day_of_year, config.locations_per_day),
    )
}

fn duration_until_next_run(now: DateTime<Local>, run_hour: u32) -> std::time::Duration {
    let hour = run_hour.min(23);
    let today_target = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("valid wall-clock hour");

    let target_naive = if now.naive_local() < today_target {
        today_target
    } else {
        today_target + chrono::Duration::days(1)
    };

    // DST can make a local time ambiguous or nonexistent; fall back to an
    // hour's wait and recompute on the next loop pass.
    match target_naive.and_local_timezone(Local) {
        chrono::LocalResult::Single(target) | chrono::LocalResult::Ambiguous(target, _) => {
            (target - now).to_std().unwrap_or_default()
        }
        chrono::LocalResult::None => std::time::Duration::from_secs(3600),
    }
}
