use carryover_config::Config;
use carryover_storage_json::StoragePaths;

pub const DEFAULT_LOG_FILTER: &str = "carryover=info";

/// Installs the global fmt subscriber. `RUST_LOG` directives are kept and `directive`
/// is added on top; an unparsable directive falls back to the default one.
pub fn init_tracing(directive: &str) {
    use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

    let mut filter = EnvFilter::from_default_env();
    if let Ok(parsed) = directive
        .parse::<Directive>()
        .or_else(|_| DEFAULT_LOG_FILTER.parse())
    {
        filter = filter.add_directive(parsed);
    }

    // Another subscriber may already be installed by the host application.
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Where the JSON store keeps the book and its backups for `config`.
pub fn storage_paths(config: &Config) -> StoragePaths {
    StoragePaths {
        data_root: config.resolve_data_root(),
        backup_root: config.resolve_backup_root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn storage_paths_follow_config_roots() {
        let config = Config {
            data_root: Some(PathBuf::from("/var/lib/carryover")),
            ..Config::default()
        };
        let paths = storage_paths(&config);
        assert_eq!(paths.data_root, PathBuf::from("/var/lib/carryover"));
        assert_eq!(paths.backup_root, PathBuf::from("/var/lib/carryover/backups"));
    }
}
