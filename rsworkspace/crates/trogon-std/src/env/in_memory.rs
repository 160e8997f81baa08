use std::collections::HashMap;
use std::env::VarError;
use std::sync::{Mutex, PoisonError};

use super::ReadEnv;

/// Won't touch the global process environment.
///
/// All methods take `&self`; the map sits behind a `Mutex` so one instance
/// can be shared across threads.
#[derive(Debug, Default)]
pub struct InMemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl InMemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadEnv for InMemoryEnv {
    fn var(&self, key: &str) -> Result<String, VarError> {
        self.lock().get(key).cloned().ok_or(VarError::NotPresent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_read() {
        let env = InMemoryEnv::new();
        env.set("PUB_SUB_PROJECT_ID", "demo-project");

        assert_eq!(env.var("PUB_SUB_PROJECT_ID").unwrap(), "demo-project");
        assert!(env.contains("PUB_SUB_PROJECT_ID"));
    }

    #[test]
    fn remove_makes_var_not_present() {
        let env = InMemoryEnv::new();
        env.set("PORT", "9090");
        env.remove("PORT");

        assert!(matches!(env.var("PORT"), Err(VarError::NotPresent)));
    }

    #[test]
    fn overwrite_keeps_last_value() {
        let env = InMemoryEnv::new();
        env.set("BASE_HOST", "https://a.example");
        env.set("BASE_HOST", "https://b.example");

        assert_eq!(env.var("BASE_HOST").unwrap(), "https://b.example");
    }

    #[test]
    fn shared_across_threads() {
        let env = std::sync::Arc::new(InMemoryEnv::new());
        let writer = std::sync::Arc::clone(&env);

        std::thread::spawn(move || writer.set("FROM_THREAD", "yes"))
            .join()
            .unwrap();

        assert_eq!(env.var("FROM_THREAD").unwrap(), "yes");
    }
}
