//! Resolves where scrollband looks for its configuration file.
//!
//! `SCROLLBAND_CONFIG_DIR` overrides the platform config directory; an
//! explicit `--config` path overrides both.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "SCROLLBAND_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "scrollband";
const APPLICATION: &str = "scrollband";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    explicit_config: Option<PathBuf>,
}

impl AppPaths {
    pub fn discover(explicit_config: Option<PathBuf>) -> Result<Self> {
        let config_dir = match env_override(ENV_CONFIG_DIR) {
            Some(dir) => dir,
            None => ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
                .ok_or_else(|| anyhow!("failed to determine user directories"))?
                .config_dir()
                .to_path_buf(),
        };

        Ok(Self {
            config_dir,
            explicit_config,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Config file to load: the `--config` path if given, else the default.
    pub fn config_file(&self) -> PathBuf {
        self.explicit_config
            .clone()
            .unwrap_or_else(|| self.config_dir.join(CONFIG_FILE))
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit_config.is_some()
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn clear(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_sets_config_dir() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let paths = AppPaths::discover(None).unwrap();
        assert_eq!(paths.config_dir(), root.path());
        assert_eq!(paths.config_file(), root.path().join("config.toml"));
        assert!(!paths.is_explicit());
    }

    #[test]
    fn explicit_file_wins_over_env() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, root.path());
        let explicit = root.path().join("custom.toml");

        let paths = AppPaths::discover(Some(explicit.clone())).unwrap();
        assert_eq!(paths.config_file(), explicit);
        assert!(paths.is_explicit());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn empty_env_value_is_ignored() {
        let _guard = env_lock().lock().unwrap();
        let _config_guard = EnvGuard::clear(ENV_CONFIG_DIR);
        env::set_var(ENV_CONFIG_DIR, "");

        let paths = AppPaths::discover(None).unwrap();
        assert!(paths.config_dir().ends_with("scrollband"));
    }
}
