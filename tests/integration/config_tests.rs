use dupemgr::config::{Config, ENV_PREFIX};
use dupemgr::scanner::{HashAlgorithm, MAX_BLOCK_SIZE};
use figment::providers::Serialized;
use figment::Figment;
use std::fs;
use std::sync::{Mutex, MutexGuard};
use tempfile::tempdir;

// Tests that read or write `DUPEMGR_*` variables hold this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn set_env(key: &str, value: &str) {
    std::env::set_var(format!("{ENV_PREFIX}{key}"), value);
}

fn clear_env(key: &str) {
    std::env::remove_var(format!("{ENV_PREFIX}{key}"));
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert!(!config.use_trash);
}

#[test]
fn test_config_load_from_env() {
    let _guard = env_lock();
    let temp_dir = tempdir().unwrap();
    set_env("SKIP_HIDDEN", "true");
    set_env("ALGORITHM", "blake3");

    let config = Config::load(Some(temp_dir.path().join("absent.toml").as_path()));
    clear_env("SKIP_HIDDEN");
    clear_env("ALGORITHM");

    let config = config.unwrap();
    assert!(config.skip_hidden);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert!(config.finder_config().tree_options.skip_hidden);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
trash_dirs = ["Papierkorb"]
algorithm = "blake3"
use_trash = true
"#;
    fs::write(&config_path, toml_content).unwrap();

    let _guard = env_lock();
    let config = Config::load(Some(config_path.as_path())).unwrap();

    assert_eq!(config.trash_dirs, vec!["Papierkorb".to_string()]);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert!(config.use_trash);
    assert!(!config.delete_config().permanent);
    assert_eq!(config.hasher().algorithm(), HashAlgorithm::Blake3);
}

#[test]
fn test_env_overrides_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "block_size = 1024\nuse_trash = false\n").unwrap();

    let _guard = env_lock();
    set_env("BLOCK_SIZE", "2048");
    set_env("USE_TRASH", "true");
    let config = Config::load(Some(config_path.as_path()));
    clear_env("BLOCK_SIZE");
    clear_env("USE_TRASH");

    let config = config.unwrap();
    assert_eq!(config.block_size, 2048);
    assert_eq!(config.hasher().block_size(), 2048);
    assert!(config.use_trash);
    assert!(!config.delete_config().permanent);
}

#[test]
fn test_env_block_size_is_capped_by_hasher() {
    let temp_dir = tempdir().unwrap();
    let _guard = env_lock();
    set_env("BLOCK_SIZE", &(MAX_BLOCK_SIZE * 4).to_string());
    let config = Config::load(Some(temp_dir.path().join("absent.toml").as_path()));
    clear_env("BLOCK_SIZE");

    let config = config.unwrap();
    assert_eq!(config.block_size, MAX_BLOCK_SIZE * 4);
    assert_eq!(config.hasher().block_size(), MAX_BLOCK_SIZE);
}

#[test]
fn test_malformed_env_value_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let _guard = env_lock();
    set_env("BLOCK_SIZE", "lots");
    let result = Config::load(Some(temp_dir.path().join("absent.toml").as_path()));
    clear_env("BLOCK_SIZE");

    assert!(result.is_err());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = tempdir().unwrap();
    let _guard = env_lock();
    let config: Config = Config::figment(Some(temp_dir.path().join("absent.toml").as_path()))
        .extract()
        .unwrap();
    assert_eq!(config.trash_dirs, Config::default().trash_dirs);
}
