use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

const FIXTURES_DIR_ENV: &str = "AMR_FIXTURES_DIR";
const DEFAULT_FIXTURES_DIR: &str = "fixtures";

/// Process-wide configuration, read once at startup (spec.md §6 "Secrets",
/// §9 "Global state"). The two salts are required; their absence is a fatal
/// misconfiguration, not a row-level error.
pub struct Config {
    pub hash_salt_pre: String,
    pub hash_salt_post: String,
    pub fixtures_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> EngineResult<Self> {
        let hash_salt_pre = require_env("HASH_SALT_PRE")?;
        let hash_salt_post = require_env("HASH_SALT_POST")?;
        let fixtures_dir = std::env::var(FIXTURES_DIR_ENV)
            .unwrap_or_else(|_| DEFAULT_FIXTURES_DIR.to_string())
            .into();
        Ok(Config {
            hash_salt_pre,
            hash_salt_post,
            fixtures_dir,
        })
    }
}

fn require_env(name: &str) -> EngineResult<String> {
    std::env::var(name).map_err(|_| {
        EngineError::Configuration(format!(
            "{name} must be set in the environment before the engine can start"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_salt_is_a_configuration_error() {
        // SAFETY (test-only): no other test in this process reads these two
        // vars concurrently; `cargo test` runs this crate's tests in one
        // process but each test gets its own thread, so removing env vars
        // here is inherently racy with other tests that set them. Guard by
        // using names no fixture/ingest test touches.
        unsafe {
            std::env::remove_var("HASH_SALT_PRE_TEST_ONLY_UNSET");
        }
        let err = require_env("HASH_SALT_PRE_TEST_ONLY_UNSET").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
