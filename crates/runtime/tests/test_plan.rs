use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use warbler_backend_api::{PendingRegistrationStore, RegistrationPayload};
use warbler_backend_runtime::{email_sender, spawn_sweeper, BackendServices, BackgroundTasks};
use warbler_config::{AppConfig, EmailConfig};
use warbler_notifications::{LikeNotificationEvent, QueueError};

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = max_connections;
    config.queue.redis_url = None;
    config.email.api_key = None;
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

fn payload(email: &str) -> RegistrationPayload {
    RegistrationPayload {
        name: "Ada".into(),
        email: email.into(),
        user_name: "ada".into(),
        password: "correct horse".into(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path), 4);

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'",
    )
    .fetch_one(&services.db_pool)
    .await?;

    assert_eq!("users", table);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_without_queue_disables_like_notifications() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(sqlite_url(&temp_dir.path().join("noqueue.db")), 1);

    let services = initialise(&config).await?;
    assert!(services.redis_client.is_none());

    let event = LikeNotificationEvent::for_like("owner@example.com", "liker");
    let result = services.publisher.publish(&event).await;
    assert!(matches!(result, Err(QueueError::Unavailable)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_tolerates_unreachable_redis() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(sqlite_url(&temp_dir.path().join("redis.db")), 1);
    config.queue.redis_url = Some("redis://127.0.0.1:1/".into());

    let services = timeout(Duration::from_secs(30), initialise(&config)).await??;
    assert!(
        services.redis_client.is_none(),
        "redis connection errors should be tolerated"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_creates_sqlite_directory_if_missing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("nested");
    let config = build_config(sqlite_url(&db_dir.join("prepared.db")), 2);

    assert!(!db_dir.exists());
    let _services = initialise(&config).await?;
    assert!(db_dir.exists(), "database directory should be created");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_enables_sqlite_foreign_keys() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(sqlite_url(&temp_dir.path().join("fk.db")), 2);

    let services = initialise(&config).await?;
    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(1, enabled, "foreign key enforcement must be enabled");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_applies_max_connections_setting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(sqlite_url(&temp_dir.path().join("max_conn.db")), 3);

    let services = initialise(&config).await?;
    assert_eq!(3, services.db_pool.options().get_max_connections());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_uses_configured_code_ttl() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(sqlite_url(&temp_dir.path().join("ttl.db")), 1);
    config.registration.code_ttl_seconds = 42;

    let services = initialise(&config).await?;
    assert_eq!(Duration::from_secs(42), services.pending.ttl());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_reports_unusable_database_url() -> Result<()> {
    let config = build_config("postgres://localhost/ignored".into(), 1);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected a non-sqlite URL to fail"),
        Err(error) => error,
    };
    assert!(error.to_string().contains("failed to initialise database"));
    Ok(())
}

#[tokio::test]
async fn email_sender_builds_without_api_key() -> Result<()> {
    let config = EmailConfig {
        api_key: Some("   ".into()),
        ..EmailConfig::default()
    };
    let sender = email_sender(&config)?;
    sender
        .send("someone@example.com", "subject", "body")
        .await
        .context("log sender never fails")?;
    Ok(())
}

#[tokio::test]
async fn sweeper_purges_expired_registrations() -> Result<()> {
    let store = PendingRegistrationStore::new(Duration::from_millis(10));
    store.put("ada@example.com", "123456", payload("ada@example.com")).await;
    assert_eq!(1, store.len().await);

    let cancel = CancellationToken::new();
    let handle = spawn_sweeper(store.clone(), Duration::from_millis(20), cancel.clone());

    let mut purged = false;
    for _ in 0..50 {
        sleep(Duration::from_millis(20)).await;
        if store.is_empty().await {
            purged = true;
            break;
        }
    }

    cancel.cancel();
    timeout(Duration::from_secs(1), handle).await??;
    assert!(purged, "expired entry should have been swept");
    Ok(())
}

#[tokio::test]
async fn sweeper_keeps_live_registrations() -> Result<()> {
    let store = PendingRegistrationStore::new(Duration::from_secs(300));
    store.put("ada@example.com", "123456", payload("ada@example.com")).await;

    let cancel = CancellationToken::new();
    let handle = spawn_sweeper(store.clone(), Duration::from_millis(10), cancel.clone());
    sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    timeout(Duration::from_secs(1), handle).await??;

    assert_eq!(
        Some("123456".to_string()),
        store.get_code("ada@example.com").await
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn background_tasks_stop_on_shutdown() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(sqlite_url(&temp_dir.path().join("tasks.db")), 1);
    let services = initialise(&config).await?;

    let tasks = BackgroundTasks::spawn(&services, CancellationToken::new());
    assert_eq!(1, tasks.len(), "only the sweeper runs without a queue");

    timeout(Duration::from_secs(1), tasks.shutdown())
        .await
        .context("background tasks should stop promptly")?;
    Ok(())
}
