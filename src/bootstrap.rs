//! # Relay System Bootstrap
//!
//! Composition root for the two actor pools. Everything is wired from a
//! [`RelayConfig`] plus injected collaborators, so the same assembly runs
//! against Telegram in production and against recording transports in tests.
//!
//! ```text
//! applicant source ─▶ WorkerPool ─▶ Router(applicant) ─▶ start/registration/policy
//!                                                            │ publish
//!                                                            ▼
//!                                                   relay channel (ChannelQueue)
//! reviewer source ──▶ WorkerPool ─▶ BusPublisher ─▶ EventBus ─┤ channel_post
//!                                                   ├─ message/callback ─▶ Router(reviewer)
//!                                                   └─ actor:approved/rejected ─▶ notifications
//! ```

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::RelayConfig;
use crate::constants::pools;
use crate::database::ActorRepository;
use crate::error::RelayResult;
use crate::events::{EventBus, InMemoryEventBus};
use crate::execution::{
    subscribe_router, BusPublisher, Router, WorkerPool, WorkerPoolConfig, WorkerPoolStats,
};
use crate::handlers::{
    subscribe_notifications, ApprovalCallback, ForwardingHandler, PolicyCallback,
    RegistrationHandler, StartCommand,
};
use crate::messaging::{ChannelQueue, VerificationQueue};
use crate::models::Actor;
use crate::registry::HandlerRegistry;
use crate::state_machine::{RegistrationGuards, RegistrationStateMachine};
use crate::transport::{ChatTransport, UpdateSource};

/// Transport pair for one bot: outbound calls and the inbound update stream
#[derive(Clone)]
pub struct BotEndpoints {
    pub transport: Arc<dyn ChatTransport>,
    pub source: Arc<dyn UpdateSource>,
}

impl BotEndpoints {
    pub fn new(transport: Arc<dyn ChatTransport>, source: Arc<dyn UpdateSource>) -> Self {
        Self { transport, source }
    }
}

impl std::fmt::Debug for BotEndpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotEndpoints").finish_non_exhaustive()
    }
}

/// Final counters reported by [`RelaySystem::run`]
#[derive(Debug, Clone, Default)]
pub struct RelayRunSummary {
    pub applicant: WorkerPoolStats,
    pub reviewer: WorkerPoolStats,
    /// Whether every bus handler finished within the shutdown timeout
    pub bus_drained: bool,
}

/// Fully wired relay, ready to run
pub struct RelaySystem {
    config: RelayConfig,
    repository: Arc<dyn ActorRepository>,
    bus: Arc<InMemoryEventBus>,
    queue: Arc<ChannelQueue>,
    applicant_router: Arc<Router>,
    reviewer_router: Arc<Router>,
    applicant_pool: WorkerPool,
    reviewer_pool: WorkerPool,
    applicant: BotEndpoints,
    reviewer: BotEndpoints,
}

impl std::fmt::Debug for RelaySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySystem")
            .field("app_env", &self.config.app_env)
            .field("bus", &self.bus)
            .field("queue", &self.queue)
            .field("applicant_pool", &self.applicant_pool)
            .field("reviewer_pool", &self.reviewer_pool)
            .finish()
    }
}

impl RelaySystem {
    /// Validate `config` and wire every component.
    ///
    /// Subscriptions are registered here, before any update is polled, so the
    /// first relayed artifact already has a forwarding subscriber.
    #[instrument(skip_all, fields(app_env = %config.app_env))]
    pub fn build(
        config: RelayConfig,
        repository: Arc<dyn ActorRepository>,
        applicant: BotEndpoints,
        reviewer: BotEndpoints,
    ) -> RelayResult<Self> {
        config.validate()?;

        let bus = Arc::new(InMemoryEventBus::new(config.event_bus.bus_config()));
        let bus_handle: Arc<dyn EventBus> = bus.clone();

        let guards = RegistrationGuards::new(config.registration.country_strategies.clone())?;
        let machine = Arc::new(RegistrationStateMachine::new(guards));

        let queue = Arc::new(ChannelQueue::new(
            applicant.transport.clone(),
            config.relay.channel_id,
            bus_handle.clone(),
        ));
        queue.subscribe(Arc::new(ForwardingHandler::new(
            repository.clone(),
            reviewer.transport.clone(),
            config.relay.review_channel_id,
            config.registration.country_strategies.clone(),
        )))?;

        let mut applicant_registry = HandlerRegistry::new();
        applicant_registry
            .register_command(Arc::new(StartCommand::new(
                repository.clone(),
                applicant.transport.clone(),
                &machine,
            )))?
            .register_callback(Arc::new(PolicyCallback::new(
                repository.clone(),
                applicant.transport.clone(),
            )))?
            .register_message(Arc::new(RegistrationHandler::new(
                repository.clone(),
                applicant.transport.clone(),
                queue.clone(),
                machine.clone(),
                config.registration.policy_url.clone(),
            )));

        let applicant_router = Arc::new(
            Router::builder(pools::APPLICANT)
                .registry(applicant_registry)
                .repository(repository.clone())
                .transport(applicant.transport.clone())
                .build()?,
        );

        let mut reviewer_registry = HandlerRegistry::new();
        reviewer_registry.register_callback(Arc::new(ApprovalCallback::new(
            repository.clone(),
            reviewer.transport.clone(),
            bus_handle.clone(),
        )))?;

        let reviewer_router = Arc::new(
            Router::builder(pools::REVIEWER)
                .registry(reviewer_registry)
                .repository(repository.clone())
                .transport(reviewer.transport.clone())
                .require_reviewer(true)
                .build()?,
        );

        subscribe_router(bus.as_ref(), reviewer_router.clone())?;
        subscribe_notifications(bus.as_ref(), applicant.transport.clone())?;

        let applicant_pool = WorkerPool::new(
            pools::APPLICANT,
            WorkerPoolConfig::from(&config.applicant_bot.polling),
            applicant_router.clone(),
        );
        let reviewer_pool = WorkerPool::new(
            pools::REVIEWER,
            WorkerPoolConfig::from(&config.reviewer_bot.polling),
            Arc::new(BusPublisher::new(bus_handle)),
        );

        info!(
            relay_channel = config.relay.channel_id,
            review_channel = config.relay.review_channel_id,
            countries = config.registration.country_strategies.len(),
            "✅ Relay system wired"
        );

        Ok(Self {
            config,
            repository,
            bus,
            queue,
            applicant_router,
            reviewer_router,
            applicant_pool,
            reviewer_pool,
            applicant,
            reviewer,
        })
    }

    /// Make sure every configured reviewer handle has a reviewer actor record.
    ///
    /// Existing records are left untouched.
    pub async fn seed_reviewers(&self) -> RelayResult<usize> {
        let mut created = 0;
        for &handle in &self.config.relay.reviewer_handles {
            if self.repository.get_by_handle(handle).await?.is_some() {
                continue;
            }
            self.repository.create(&Actor::new_reviewer(handle)).await?;
            info!(reviewer_handle = handle, "💾 Seeded reviewer actor");
            created += 1;
        }
        Ok(created)
    }

    /// Run both ingestion loops until `cancel` fires, then drain.
    ///
    /// Worker pools finish their queued updates first; bus handlers spawned by
    /// that work are awaited afterwards, bounded by the configured timeout.
    pub async fn run(&self, cancel: CancellationToken) -> RelayRunSummary {
        info!("🚀 Relay system starting");

        let (applicant, reviewer) = tokio::join!(
            self.applicant_pool
                .run(self.applicant.source.clone(), cancel.clone()),
            self.reviewer_pool
                .run(self.reviewer.source.clone(), cancel.clone()),
        );

        info!("⏳ Worker pools drained; waiting for bus handlers");
        let bus_drained = self.bus.shutdown_default().await;
        if !bus_drained {
            warn!("Bus handlers still running after shutdown timeout");
        }

        info!(
            applicant_processed = applicant.updates_processed,
            reviewer_processed = reviewer.updates_processed,
            bus_drained,
            "🛑 Relay system stopped"
        );
        RelayRunSummary {
            applicant,
            reviewer,
            bus_drained,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn queue(&self) -> &Arc<ChannelQueue> {
        &self.queue
    }

    pub fn applicant_router(&self) -> &Arc<Router> {
        &self.applicant_router
    }

    pub fn reviewer_router(&self) -> &Arc<Router> {
        &self.reviewer_router
    }

    pub fn repository(&self) -> &Arc<dyn ActorRepository> {
        &self.repository
    }
}
