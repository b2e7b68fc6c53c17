use carryover_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let config = manager.load().expect("load defaults");
    assert_eq!(config, Config::default());
    assert_eq!(config.log_filter, "carryover=info");
    assert!(manager.backups_dir().exists());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"), dir.path().join("backups"));

    let config = Config {
        currency: "EUR".into(),
        default_cycle: "week".into(),
        default_cycle_start_day: 7,
        default_rollover: true,
        ..Config::default()
    };
    manager.save(&config).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, config);
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn invalid_config_is_not_saved() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"), dir.path().join("backups"));

    let config = Config {
        default_cycle: "quarter".into(),
        ..Config::default()
    };
    assert!(matches!(manager.save(&config), Err(ConfigError::Invalid(_))));
    assert!(!manager.config_path().exists());
}

#[test]
fn backup_and_restore_round_trip() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let original = Config {
        currency: "GBP".into(),
        ..Config::default()
    };
    manager.save(&original).expect("save");
    let name = manager
        .backup(&original, Some("before change"))
        .expect("backup");
    assert!(name.ends_with("_before-change.json"));

    let changed = Config {
        currency: "JPY".into(),
        ..Config::default()
    };
    manager.save(&changed).expect("save changed");

    let restored = manager.restore(&name).expect("restore");
    assert_eq!(restored.currency, "GBP");
    assert_eq!(manager.load().expect("reload").currency, "GBP");
    assert_eq!(manager.list_backups().expect("list"), vec![name]);
}

#[test]
fn restoring_unknown_backup_fails() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    assert!(matches!(
        manager.restore("config_20260101_000000.json"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn blank_currency_is_invalid() {
    let config = Config {
        currency: "  ".into(),
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}
