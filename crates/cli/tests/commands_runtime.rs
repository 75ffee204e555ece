use std::env;
use std::sync::{Mutex, OnceLock};

use eshop_cli::commands::{config, doctor, seed};
use serde_json::Value;

#[test]
fn seed_inserts_requested_count_in_batches() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = file_url(&temp_dir);

    with_env(&[("ESHOP_DATABASE_URL", &url)], || {
        let result = seed::run(seed::SeedArgs {
            count: Some(237),
            batch_size: Some(50),
            collection: Some("cli_seed".to_string()),
            rng_seed: Some(7),
        });
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["report"]["total_inserted"], 237);
        assert_eq!(payload["report"]["batches"], 5);
        assert_eq!(payload["report"]["failed_documents"], 0);
    });
}

#[test]
fn seed_uses_configured_defaults_for_absent_arguments() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = file_url(&temp_dir);

    with_env(
        &[
            ("ESHOP_DATABASE_URL", &url),
            ("ESHOP_SEED_COUNT", "30"),
            ("ESHOP_SEED_BATCH_SIZE", "8"),
        ],
        || {
            let result = seed::run(seed::SeedArgs::default());
            assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["report"]["total_inserted"], 30);
            assert_eq!(payload["report"]["batches"], 4);
            let message = payload["message"].as_str().expect("message");
            assert!(message.contains("`customers`"), "{message}");
        },
    );
}

#[test]
fn seed_rejects_zero_batch_size() {
    with_env(&[("ESHOP_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run(seed::SeedArgs { batch_size: Some(0), ..seed::SeedArgs::default() });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "seed_validation");
    });
}

#[test]
fn seed_rejects_malformed_collection_name() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = file_url(&temp_dir);

    with_env(&[("ESHOP_DATABASE_URL", &url)], || {
        let result = seed::run(seed::SeedArgs {
            count: Some(1),
            collection: Some("clientes; drop".to_string()),
            ..seed::SeedArgs::default()
        });
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_collection");
    });
}

#[test]
fn seed_reports_unreachable_storage() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}/absent/eshop.db", temp_dir.path().display());

    with_env(&[("ESHOP_DATABASE_URL", &url), ("ESHOP_DATABASE_TIMEOUT_SECS", "1")], || {
        let result = seed::run(seed::SeedArgs { count: Some(1), ..seed::SeedArgs::default() });
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "db_connectivity");
    });
}

#[test]
fn seed_returns_config_failure_for_invalid_env() {
    with_env(&[("ESHOP_DATABASE_URL", "postgres://localhost/eshop")], || {
        let result = seed::run(seed::SeedArgs::default());
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_against_reachable_storage() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = file_url(&temp_dir);

    with_env(&[("ESHOP_DATABASE_URL", &url)], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks");
        assert_eq!(checks.len(), 3);
    });
}

#[test]
fn doctor_skips_storage_checks_when_config_is_invalid() {
    with_env(&[("ESHOP_DEFAULT_COLLECTION", "not-valid")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

#[test]
fn config_lists_effective_values() {
    with_env(&[("ESHOP_DATABASE_NAME", "loja")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert!(result.output.contains("database.name = loja"), "{}", result.output);
    });
}

#[test]
fn config_returns_config_failure_for_invalid_env() {
    with_env(&[("ESHOP_DATABASE_URL", "postgres://localhost/eshop")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn file_url(temp_dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}/eshop.db?mode=rwc", temp_dir.path().display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ESHOP_DATABASE_URL",
        "ESHOP_DATABASE_NAME",
        "ESHOP_DATABASE_MAX_CONNECTIONS",
        "ESHOP_DATABASE_TIMEOUT_SECS",
        "ESHOP_DEFAULT_COLLECTION",
        "ESHOP_SEED_COUNT",
        "ESHOP_SEED_BATCH_SIZE",
        "ESHOP_SERVER_BIND_ADDRESS",
        "ESHOP_SERVER_PORT",
        "ESHOP_LOGGING_LEVEL",
        "ESHOP_LOGGING_FORMAT",
        "ESHOP_LOG_LEVEL",
        "ESHOP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
