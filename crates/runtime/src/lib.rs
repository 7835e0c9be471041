use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use warbler_auth::Authenticator;
use warbler_backend_api::{AppState, PendingRegistrationStore};
use warbler_config::{AppConfig, EmailConfig, QueueConfig};
use warbler_database::initialize_database;
use warbler_notifications::{
    BrevoEmailSender, DisabledEventPublisher, EmailSender, EventPublisher, LogEmailSender,
    NotificationConsumer, RedisEventPublisher,
};

const CONSUMER_RETRY_DELAY: Duration = Duration::from_secs(5);

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub pending: PendingRegistrationStore,
    pub email: Arc<dyn EmailSender>,
    pub publisher: Arc<dyn EventPublisher>,
    /// Set only when the queue is configured and reachable at startup.
    pub redis_client: Option<redis::Client>,
    pub queue_topic: String,
    pub sweep_interval: Duration,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), &config.auth);
        let pending = PendingRegistrationStore::new(Duration::from_secs(
            config.registration.code_ttl_seconds,
        ));
        let email = email_sender(&config.email)?;
        let (redis_client, publisher) = connect_queue(&config.queue).await;

        info!(
            queue_enabled = redis_client.is_some(),
            code_ttl_seconds = config.registration.code_ttl_seconds,
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            pending,
            email,
            publisher,
            redis_client,
            queue_topic: config.queue.topic.clone(),
            sweep_interval: Duration::from_secs(config.registration.sweep_interval_seconds.max(1)),
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.db_pool.clone(),
            self.authenticator.clone(),
            self.pending.clone(),
            self.email.clone(),
            self.publisher.clone(),
        )
    }
}

/// Brevo when an API key is configured, otherwise a sender that only logs.
pub fn email_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let sender =
                BrevoEmailSender::new(config, key).context("failed to build email client")?;
            info!(base_url = %config.base_url, "email delivery enabled");
            Ok(Arc::new(sender))
        }
        _ => {
            warn!("no email API key configured, outgoing emails will only be logged");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

async fn connect_queue(config: &QueueConfig) -> (Option<redis::Client>, Arc<dyn EventPublisher>) {
    let Some(url) = config.redis_url.as_deref() else {
        info!("no queue configured, like notifications are disabled");
        return (None, Arc::new(DisabledEventPublisher));
    };

    let client = match redis::Client::open(url) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "invalid redis url, like notifications are disabled");
            return (None, Arc::new(DisabledEventPublisher));
        }
    };

    match ConnectionManager::new(client.clone()).await {
        Ok(connection) => {
            info!(topic = %config.topic, "redis connection established");
            (
                Some(client),
                Arc::new(RedisEventPublisher::new(connection, config.topic.clone())),
            )
        }
        Err(e) => {
            warn!(error = %e, "failed to connect to redis, like notifications are disabled");
            (None, Arc::new(DisabledEventPublisher))
        }
    }
}

/// Long-running tasks that live alongside the HTTP server.
pub struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Start the pending-registration sweeper and, when the queue is
    /// available, the notification consumer. Both stop when `cancel` fires.
    pub fn spawn(services: &BackendServices, cancel: CancellationToken) -> Self {
        let mut handles = vec![spawn_sweeper(
            services.pending.clone(),
            services.sweep_interval,
            cancel.clone(),
        )];

        if let Some(client) = services.redis_client.clone() {
            let consumer = NotificationConsumer::new(services.email.clone(), &services.queue_topic);
            handles.push(tokio::spawn(run_consumer(consumer, client, cancel.clone())));
        }

        Self { cancel, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every task and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "background task panicked");
            }
        }
        info!("background tasks stopped");
    }
}

/// Periodically drop expired pending registrations.
pub fn spawn_sweeper(
    store: PendingRegistrationStore,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = store.purge_expired().await;
                    if purged > 0 {
                        info!(purged, "purged expired pending registrations");
                    }
                }
            }
        }
    })
}

/// Keep the consumer subscribed until cancelled, resubscribing after
/// connection loss.
async fn run_consumer(
    consumer: NotificationConsumer,
    client: redis::Client,
    cancel: CancellationToken,
) {
    loop {
        match consumer.run(&client, cancel.clone()).await {
            Ok(_) if cancel.is_cancelled() => break,
            Ok(_) => warn!(topic = %consumer.topic(), "notification subscription closed"),
            Err(e) => error!(topic = %consumer.topic(), error = %e, "notification consumer failed"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(CONSUMER_RETRY_DELAY) => {}
        }
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(?error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(?error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
