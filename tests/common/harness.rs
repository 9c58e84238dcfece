//! Runs a fully wired [`RelaySystem`] against recording transports, scripted
//! update sources and the in-memory repository.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use relay_core::bootstrap::{BotEndpoints, RelayRunSummary, RelaySystem};
use relay_core::config::{
    BotConnectionConfig, CountryStrategy, DatabaseConfig, EventBusSettings, PollingConfig,
    RegistrationConfig, RelayChannelConfig, RelayConfig,
};
use relay_core::database::{ActorRepository, InMemoryActorRepository};
use relay_core::models::{Actor, ReplyMarkup};
use relay_core::test_helpers::fixtures;
use relay_core::test_helpers::{RecordingTransport, ScriptFeed, ScriptedUpdateSource};
use relay_core::transport::telegram::DEFAULT_API_BASE_URL;

pub const RELAY_CHANNEL: i64 = -1001;
pub const REVIEW_CHANNEL: i64 = -1002;
pub const REVIEWER_HANDLE: i64 = 900;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub fn countries() -> BTreeMap<String, CountryStrategy> {
    [("DE", "Germany", "sepa"), ("US", "United States", "ach")]
        .into_iter()
        .map(|(code, title, strategy)| {
            (
                code.to_string(),
                CountryStrategy {
                    title: title.to_string(),
                    strategy: strategy.to_string(),
                },
            )
        })
        .collect()
}

pub fn test_config() -> RelayConfig {
    let bot = |token: &str| BotConnectionConfig {
        token: token.to_string(),
        api_base_url: DEFAULT_API_BASE_URL.to_string(),
        polling: PollingConfig {
            worker_pool_size: 3,
            queue_capacity: 16,
            ..PollingConfig::default()
        },
    };

    RelayConfig {
        app_env: "test".to_string(),
        encryption_key: "ab".repeat(16),
        database: DatabaseConfig {
            url: "postgresql://localhost/relay_test".to_string(),
            max_connections: 2,
        },
        applicant_bot: bot("applicant-token"),
        reviewer_bot: bot("reviewer-token"),
        relay: RelayChannelConfig {
            channel_id: RELAY_CHANNEL,
            review_channel_id: REVIEW_CHANNEL,
            reviewer_handles: vec![REVIEWER_HANDLE],
        },
        registration: RegistrationConfig {
            policy_url: "https://example.com/terms".to_string(),
            country_strategies: countries(),
        },
        event_bus: EventBusSettings::default(),
    }
}

/// A running relay plus handles on everything it talks to
pub struct RelayHarness {
    pub system: Arc<RelaySystem>,
    pub repository: Arc<InMemoryActorRepository>,
    pub applicant: Arc<RecordingTransport>,
    pub reviewer: Arc<RecordingTransport>,
    pub applicant_feed: ScriptFeed,
    pub reviewer_feed: ScriptFeed,
    cancel: CancellationToken,
    running: JoinHandle<RelayRunSummary>,
}

impl RelayHarness {
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: RelayConfig) -> Self {
        let repository = Arc::new(InMemoryActorRepository::new());
        let applicant = Arc::new(RecordingTransport::new());
        let reviewer = Arc::new(RecordingTransport::new());
        let (applicant_source, applicant_feed) = ScriptedUpdateSource::new();
        let (reviewer_source, reviewer_feed) = ScriptedUpdateSource::new();

        let system = Arc::new(
            RelaySystem::build(
                config,
                repository.clone(),
                BotEndpoints::new(applicant.clone(), Arc::new(applicant_source)),
                BotEndpoints::new(reviewer.clone(), Arc::new(reviewer_source)),
            )
            .expect("relay system should wire"),
        );
        system
            .seed_reviewers()
            .await
            .expect("reviewers should seed");

        let cancel = CancellationToken::new();
        let running = tokio::spawn({
            let system = system.clone();
            let cancel = cancel.clone();
            async move { system.run(cancel).await }
        });

        Self {
            system,
            repository,
            applicant,
            reviewer,
            applicant_feed,
            reviewer_feed,
            cancel,
            running,
        }
    }

    /// Cancel ingestion and wait for both pools and the bus to drain
    pub async fn stop(self) -> RelayRunSummary {
        self.cancel.cancel();
        self.running.await.expect("relay task should not panic")
    }

    pub async fn actor(&self, handle: i64) -> Option<Actor> {
        self.repository
            .get_by_handle(handle)
            .await
            .expect("in-memory lookup")
    }

    /// Wait until the actor exists and satisfies `predicate`
    pub async fn wait_for_actor(
        &self,
        handle: i64,
        what: &str,
        predicate: impl Fn(&Actor) -> bool,
    ) -> Actor {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            if let Some(actor) = self.actor(handle).await {
                if predicate(&actor) {
                    return actor;
                }
            }
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until the reviewer-side bus has taken `count` events
    pub async fn wait_for_reviewer_events(&self, count: u64) {
        let bus = self.system.bus().clone();
        wait_for("reviewer events on the bus", || {
            bus.get_statistics().events_published >= count
        })
        .await;
    }

    /// Drive one applicant from `/start` through policy acceptance
    pub async fn register(&self, handle: i64, first_name: &str) -> Actor {
        let base = handle * 100;
        self.applicant_feed.push(vec![
            fixtures::text_update(base + 1, handle, "/start"),
            fixtures::text_update(base + 2, handle, first_name),
            fixtures::text_update(base + 3, handle, "Doe"),
            fixtures::contact_update(base + 4, handle, "+4915112345678", Some(handle)),
            fixtures::text_update(base + 5, handle, "AB123456"),
            fixtures::text_update(base + 6, handle, "Germany"),
            fixtures::photo_update(base + 7, handle, &format!("doc-{handle}")),
        ]);
        self.wait_for_actor(handle, "policy step", |a| {
            a.conversation_state == relay_core::ConversationState::AwaitingPolicyApproval
        })
        .await;

        self.applicant_feed.push(vec![fixtures::callback_update(
            base + 8,
            handle,
            relay_core::constants::callbacks::POLICY_ACCEPT,
        )]);
        let actor = self
            .wait_for_actor(handle, "registration complete", |a| {
                a.conversation_state == relay_core::ConversationState::None
            })
            .await;
        self.wait_for_reply_to(handle, "completion message", |text| {
            text.contains("Registration Complete")
        })
        .await;
        actor
    }

    /// Wait until the latest message sent to `chat_id` satisfies `predicate`
    pub async fn wait_for_reply_to(&self, chat_id: i64, what: &str, predicate: impl Fn(&str) -> bool) {
        let applicant = self.applicant.clone();
        wait_for(what, || {
            applicant
                .sent_messages()
                .iter()
                .rev()
                .find(|m| m.chat_id == chat_id)
                .is_some_and(|m| predicate(&m.text))
        })
        .await;
    }

    /// Echo the applicant's relay post back as a channel post, the way the
    /// reviewer bot would see it, and return the review post's buttons
    pub async fn relay_to_review(&self, actor: &Actor, update_id: i64) -> ReviewPost {
        let artifact = format!("doc-{}", actor.handle);
        let relayed = self
            .applicant
            .sent_photos()
            .into_iter()
            .find(|p| p.file_id == artifact)
            .expect("artifact should have been relayed");
        assert_eq!(relayed.chat_id, RELAY_CHANNEL);

        let already_posted = self.reviewer.sent_photos().len();
        self.reviewer_feed.push(vec![fixtures::channel_photo_post(
            update_id,
            RELAY_CHANNEL,
            &relayed.file_id,
            &relayed.caption,
        )]);

        let reviewer = self.reviewer.clone();
        wait_for("review post", || reviewer.sent_photos().len() > already_posted).await;
        let post = self
            .reviewer
            .sent_photos()
            .pop()
            .expect("review post should exist");
        assert_eq!(post.chat_id, REVIEW_CHANNEL);

        let Some(ReplyMarkup::Inline(rows)) = post.reply_markup else {
            panic!("review post should carry inline buttons");
        };
        let data = |index: usize| {
            rows[0][index]
                .callback_data
                .clone()
                .expect("review button should carry callback data")
        };
        ReviewPost {
            caption: post.caption,
            approve: data(0),
            reject: data(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewPost {
    pub caption: String,
    pub approve: String,
    pub reject: String,
}

/// Poll a synchronous condition until it holds
pub async fn wait_for(what: &str, check: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(POLL_INTERVAL).await;
    }
}
