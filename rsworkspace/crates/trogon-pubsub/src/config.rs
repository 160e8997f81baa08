use thiserror::Error;
use trogon_std::env::ReadEnv;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set to a non-empty value")]
    Missing(&'static str),
}

/// Configuration for a push subscriber process.
///
/// Resolved from environment variables:
/// - `PUB_SUB_PROJECT_ID`: Google Cloud project owning the topics and subscriptions
/// - `BASE_HOST`: base URL the backend pushes to, e.g. `https://subscriber.example.appspot.com`
/// - `PORT`: HTTP listening port (default: 8080, the App Engine convention)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConfig {
    pub project_id: Option<String>,
    pub host: Option<String>,
    pub port: u16,
}

impl PubSubConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        Self {
            project_id: env.non_empty_var("PUB_SUB_PROJECT_ID"),
            host: env.non_empty_var("BASE_HOST"),
            port: env
                .var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    pub fn project_id(&self) -> Result<&str, ConfigError> {
        self.project_id
            .as_deref()
            .ok_or(ConfigError::Missing("PUB_SUB_PROJECT_ID"))
    }

    pub fn host(&self) -> Result<&str, ConfigError> {
        self.host.as_deref().ok_or(ConfigError::Missing("BASE_HOST"))
    }

    /// Both the project id and the push host are required before a client
    /// can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.project_id()?;
        self.host()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trogon_std::env::InMemoryEnv;

    #[test]
    fn defaults_when_no_env_vars() {
        let env = InMemoryEnv::new();
        let config = PubSubConfig::from_env(&env);

        assert_eq!(config.project_id, None);
        assert_eq!(config.host, None);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn reads_all_env_vars() {
        let env = InMemoryEnv::new();
        env.set("PUB_SUB_PROJECT_ID", "demo-project");
        env.set("BASE_HOST", "https://printer.demo-project.appspot.com");
        env.set("PORT", "9090");

        let config = PubSubConfig::from_env(&env);

        assert_eq!(config.project_id().unwrap(), "demo-project");
        assert_eq!(config.host().unwrap(), "https://printer.demo-project.appspot.com");
        assert_eq!(config.port, 9090);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let env = InMemoryEnv::new();
        env.set("PORT", "not-a-number");

        assert_eq!(PubSubConfig::from_env(&env).port, 8080);
    }

    #[test]
    fn missing_project_id_fails_validation() {
        let env = InMemoryEnv::new();
        env.set("BASE_HOST", "https://printer.example.com");

        let err = PubSubConfig::from_env(&env).validate().unwrap_err();
        assert_eq!(err, ConfigError::Missing("PUB_SUB_PROJECT_ID"));
        assert_eq!(err.to_string(), "PUB_SUB_PROJECT_ID must be set to a non-empty value");
    }

    #[test]
    fn empty_host_counts_as_missing() {
        let env = InMemoryEnv::new();
        env.set("PUB_SUB_PROJECT_ID", "demo-project");
        env.set("BASE_HOST", "");

        assert_eq!(
            PubSubConfig::from_env(&env).validate(),
            Err(ConfigError::Missing("BASE_HOST"))
        );
    }
}
