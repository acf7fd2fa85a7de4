// End-to-end campaign batch scenarios with fake directory and delivery
// providers over a scratch database.

use async_trait::async_trait;
use outreach_engine::config::{CampaignConfig, ConfigStore};
use outreach_engine::database::create_db_pool;
use outreach_engine::discovery::providers::{DirectoryProvider, ListingDetails, ProviderListing};
use outreach_engine::discovery::BusinessDiscovery;
use outreach_engine::eligibility::CooldownFilter;
use outreach_engine::email_sender::{composer::EmailComposer, DeliverySender, SendOutcome};
use outreach_engine::errors::{CampaignError, CampaignResult};
use outreach_engine::models::{
    BusinessContact, EmailStatus, OutreachType, PriceEstimate, RunTrigger,
};
use outreach_engine::outreach::OutreachLog;
use outreach_engine::scheduler::CampaignScheduler;
use std::sync::{Arc, Mutex};

struct StaticProvider {
    listings: Vec<ProviderListing>,
}

#[async_trait]
impl DirectoryProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _term: &str, _location: &str) -> CampaignResult<Vec<ProviderListing>> {
        Ok(self.listings.clone())
    }

    async fn details(&self, _source_id: &str) -> CampaignResult<Option<ListingDetails>> {
        Ok(None)
    }
}

#[derive(Clone)]
struct RecordingSender {
    sent: Arc<Mutex<Vec<String>>>,
    fail_for: Option<String>,
    delay_ms: u64,
}

impl RecordingSender {
    fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_for: None,
            delay_ms: 0,
        }
    }

    fn sent_emails(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliverySender for RecordingSender {
    async fn send(
        &self,
        contact: &BusinessContact,
        _content: &outreach_engine::email_sender::composer::EmailContent,
        _tracking_id: &str,
    ) -> SendOutcome {
        if self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_for.as_deref() == Some(contact.email.as_str()) {
            return SendOutcome::failed("simulated provider rejection");
        }
        let count = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(contact.email.clone());
            sent.len()
        };
        SendOutcome::sent(format!("<msg-{}@test>", count))
    }
}

fn listing(name: &str, website: &str, rating: f64) -> ProviderListing {
    ProviderListing {
        name: name.to_string(),
        address: Some("1 High Street, Leeds".to_string()),
        tags: vec!["general_contractor".to_string()],
        rating: Some(rating),
        source_id: None,
        website: Some(website.to_string()),
        phone: None,
    }
}

fn three_kitchen_fitters() -> Vec<ProviderListing> {
    vec![
        listing("Alpha Kitchens", "https://alpha-kitchens.co.uk", 4.9),
        listing("Beta Kitchens", "https://beta-kitchens.co.uk", 4.5),
        listing("Gamma Kitchens", "https://gamma-kitchens.co.uk", 4.1),
    ]
}

fn test_config() -> CampaignConfig {
    CampaignConfig {
        daily_batch_size: 10,
        max_daily_emails: 20,
        categories_per_day: 1,
        locations_per_day: 1,
        delay_between_emails_ms: 0,
        cooldown_days: 30,
    }
}

async fn build_scheduler(
    listings: Vec<ProviderListing>,
    sender: RecordingSender,
    campaign: CampaignConfig,
) -> (tempfile::TempDir, Arc<CampaignScheduler>, OutreachLog) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outreach.db");
    let pool = create_db_pool(path.to_str().unwrap()).await.unwrap();

    let log = OutreachLog::new(pool.clone());
    let scheduler = CampaignScheduler::new(
        Arc::new(ConfigStore::new(campaign).unwrap()),
        BusinessDiscovery::new(vec![Box::new(StaticProvider { listings })], 3),
        EmailComposer::new("https://www.pricefair.co.uk"),
        Box::new(sender),
        log.clone(),
        CooldownFilter::new(pool),
        vec!["kitchen".to_string()],
        vec!["Leeds".to_string()],
    );

    (dir, Arc::new(scheduler), log)
}

#[tokio::test]
async fn batch_stops_at_daily_batch_size() {
    let sender = RecordingSender::new();
    let config = CampaignConfig {
        daily_batch_size: 2,
        max_daily_emails: 5,
        ..test_config()
    };
    let (_dir, scheduler, _log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), config).await;

    let outcome = scheduler.run_batch(RunTrigger::Manual).await.unwrap();

    assert_eq!(outcome.contacted, 2);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.failed, 0);
    // the third candidate was never attempted
    assert_eq!(sender.sent_emails().len(), 2);
}

#[tokio::test]
async fn contacted_never_exceeds_limits() {
    let sender = RecordingSender::new();
    let config = CampaignConfig {
        daily_batch_size: 3,
        max_daily_emails: 3,
        ..test_config()
    };
    let (_dir, scheduler, _log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), config).await;

    let outcome = scheduler.run_batch(RunTrigger::Manual).await.unwrap();
    assert!(outcome.contacted <= 3);
}

#[tokio::test]
async fn previously_contacted_business_is_skipped_before_delivery() {
    let sender = RecordingSender::new();
    let (_dir, scheduler, log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), test_config()).await;

    // Beta already has an outreach record inside its cooldown window.
    let beta = BusinessContact {
        name: "Beta Kitchens".to_string(),
        email: "info@beta-kitchens.co.uk".to_string(),
        phone: None,
        website: Some("https://beta-kitchens.co.uk".to_string()),
        location: "Leeds".to_string(),
        category: "kitchen".to_string(),
        source_id: None,
        rating: None,
        price_estimate: PriceEstimate::Unknown,
        opening_hours: None,
    };
    log.record_attempt(
        &beta,
        OutreachType::SystematicDiscovery,
        "kitchen",
        "trk-existing",
        EmailStatus::Sent,
        None,
        30,
    )
    .await
    .unwrap();

    let outcome = scheduler.run_batch(RunTrigger::Manual).await.unwrap();

    assert_eq!(outcome.contacted, 2);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.failed, 0);
    // the skipped candidate never reached the delivery client
    assert!(!sender
        .sent_emails()
        .contains(&"info@beta-kitchens.co.uk".to_string()));
}

#[tokio::test]
async fn delivery_failure_is_logged_and_batch_proceeds() {
    let mut sender = RecordingSender::new();
    sender.fail_for = Some("info@alpha-kitchens.co.uk".to_string());
    let (_dir, scheduler, log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), test_config()).await;

    let outcome = scheduler.run_batch(RunTrigger::Manual).await.unwrap();

    assert_eq!(outcome.contacted, 2);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.failed, 1);

    let record = log
        .latest_for_email("info@alpha-kitchens.co.uk")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.email_status, EmailStatus::Failed);

    // the failure did not stop the other candidates
    assert_eq!(sender.sent_emails().len(), 2);
}

#[tokio::test]
async fn every_attempt_leaves_exactly_one_record() {
    let sender = RecordingSender::new();
    let (_dir, scheduler, log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), test_config()).await;

    scheduler.run_batch(RunTrigger::Manual).await.unwrap();

    let page = log.query(&Default::default()).await.unwrap();
    assert_eq!(page.total_count, 3);
    for record in &page.records {
        assert_eq!(record.email_status, EmailStatus::Sent);
        assert!(record.cooldown_until > record.date_contacted);
        assert!(record.provider_message_id.is_some());
    }
}

#[tokio::test]
async fn concurrent_manual_trigger_is_rejected() {
    let mut sender = RecordingSender::new();
    sender.delay_ms = 150;
    let (_dir, scheduler, _log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), test_config()).await;

    let background = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run_batch(RunTrigger::Scheduled).await })
    };

    // give the background batch time to take the running slot
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let second = scheduler.run_batch(RunTrigger::Manual).await;
    assert!(matches!(second, Err(CampaignError::BatchAlreadyRunning)));

    let first = background.await.unwrap().unwrap();
    assert_eq!(first.contacted, 3);
}

#[tokio::test]
async fn second_run_same_day_skips_everyone() {
    let sender = RecordingSender::new();
    let (_dir, scheduler, _log) =
        build_scheduler(three_kitchen_fitters(), sender.clone(), test_config()).await;

    let first = scheduler.run_batch(RunTrigger::Manual).await.unwrap();
    assert_eq!(first.contacted, 3);

    let second = scheduler.run_batch(RunTrigger::Manual).await.unwrap();
    assert_eq!(second.contacted, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(sender.sent_emails().len(), 3);
}
