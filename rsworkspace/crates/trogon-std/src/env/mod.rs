//! Environment variable access behind a trait.
//!
//! ```
//! use trogon_std::env::{ReadEnv, SystemEnv};
//!
//! fn listen_port<E: ReadEnv>(env: &E) -> u16 {
//!     env.var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080)
//! }
//!
//! let _port = listen_port(&SystemEnv);
//! ```

#[cfg(any(test, feature = "test-support"))]
mod in_memory;

use std::env::VarError;

#[cfg(any(test, feature = "test-support"))]
pub use in_memory::InMemoryEnv;

pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, VarError>;

    /// Like [`ReadEnv::var`], but treats an empty value as unset.
    fn non_empty_var(&self, key: &str) -> Option<String> {
        self.var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Zero-sized type that delegates to `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_matches_std() {
        assert_eq!(SystemEnv.var("PATH").is_ok(), std::env::var("PATH").is_ok());
    }

    #[test]
    fn system_env_missing_var_is_not_present() {
        assert!(matches!(
            SystemEnv.var("TROGON_STD_SURELY_UNSET_4711"),
            Err(VarError::NotPresent)
        ));
    }

    #[test]
    fn non_empty_var_filters_blank_values() {
        let env = InMemoryEnv::new();
        env.set("BLANK", "");
        env.set("SET", "value");

        assert_eq!(env.non_empty_var("BLANK"), None);
        assert_eq!(env.non_empty_var("MISSING"), None);
        assert_eq!(env.non_empty_var("SET").as_deref(), Some("value"));
    }
}
