//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they do not
//! interfere with each other.

use dhp_vault::config::{load_config, DatabaseTarget};
use dhp_vault::core::VaultStore;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for key in [
        "DHP_VAULT_APPLICATION_LOG_LEVEL",
        "DHP_VAULT_DATABASE_TARGET",
        "DHP_VAULT_STORE_HISTORY_LIMIT",
        "DHP_VAULT_POSTGRESQL_HOST",
        "DHP_VAULT_POSTGRESQL_PASSWORD",
        "TEST_DHP_VAULT_PG_PASSWORD",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const POSTGRES_CONFIG: &str = r#"
database_target = "postgresql"

[application]
log_level = "debug"

[store]
history_limit = 25

[postgresql]
host = "db.internal"
port = 6543
database = "patients"
user = "vault"
password = "${TEST_DHP_VAULT_PG_PASSWORD}"
max_connections = 8
ssl_mode = "disable"

[logging]
local_enabled = true
local_path = "/tmp/dhp-vault"
local_rotation = "hourly"
"#;

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_DHP_VAULT_PG_PASSWORD", "s3cret");

    let file = write_config(POSTGRES_CONFIG);
    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.database_target, DatabaseTarget::PostgreSQL);
    assert_eq!(config.store.history_limit, 25);

    let pg = config.postgresql.as_ref().unwrap();
    assert_eq!(pg.host, "db.internal");
    assert_eq!(pg.port, 6543);
    assert_eq!(pg.max_connections, 8);
    assert_eq!(pg.statement_timeout_seconds, 60);
    assert_eq!(pg.password.expose_secret().as_ref(), "s3cret");
    assert!(!format!("{:?}", pg.password).contains("s3cret"));

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(POSTGRES_CONFIG);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_DHP_VAULT_PG_PASSWORD"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_DHP_VAULT_PG_PASSWORD", "from-file");
    std::env::set_var("DHP_VAULT_STORE_HISTORY_LIMIT", "3");
    std::env::set_var("DHP_VAULT_POSTGRESQL_HOST", "override.internal");
    std::env::set_var("DHP_VAULT_POSTGRESQL_PASSWORD", "from-env");

    let file = write_config(POSTGRES_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.store.history_limit, 3);
    let pg = config.postgresql.unwrap();
    assert_eq!(pg.host, "override.internal");
    assert_eq!(pg.password.expose_secret().as_ref(), "from-env");

    cleanup_env_vars();
}

#[test]
fn test_invalid_history_limit_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
database_target = "memory"

[store]
history_limit = 0
"#,
    );
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_postgresql_section_required() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("database_target = \"postgresql\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("postgresql configuration is required"));
}

#[tokio::test]
async fn test_memory_config_opens_store() {
    let config = {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();
        let file = write_config("database_target = \"memory\"\n[store]\nhistory_limit = 7\n");
        load_config(file.path()).unwrap()
    };

    let store = VaultStore::open(&config).await.unwrap();
    assert_eq!(store.history_limit().get(), 7);
    assert_eq!(store.backend_name(), "memory");
    store.close().await.unwrap();
}

#[test]
fn test_example_config_is_valid() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("DHP_VAULT_DB_PASSWORD", "example");

    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("dhp-vault.example.toml");
    let config = load_config(path).expect("example config should load");
    assert_eq!(config.database_target, DatabaseTarget::PostgreSQL);
    assert_eq!(config.store.history_limit, 10);

    std::env::remove_var("DHP_VAULT_DB_PASSWORD");
}
