use crate::adapters::http::Endpoints;
use crate::core::ConfigProvider;
use crate::domain::model::{DEFAULT_NOTIFICATION_TTL, DEFAULT_SUCCESS_REVERT};
use crate::utils::error::{CartError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub endpoints: Option<EndpointsConfig>,
    pub notifications: Option<NotificationsConfig>,
    pub dispatch: Option<DispatchConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub add: Option<String>,
    pub update: Option<String>,
    pub remove: Option<String>,
    pub cart_view: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub ttl_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub success_revert_ms: Option<u64>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CartError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CartError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// `${VAR}` is replaced by the environment value; unset variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn endpoints(&self) -> Endpoints {
        let mut endpoints = Endpoints::default();
        if let Some(overrides) = &self.endpoints {
            if let Some(add) = &overrides.add {
                endpoints.add = add.clone();
            }
            if let Some(update) = &overrides.update {
                endpoints.update = update.clone();
            }
            if let Some(remove) = &overrides.remove {
                endpoints.remove = remove.clone();
            }
            if let Some(cart_view) = &overrides.cart_view {
                endpoints.cart_view = cart_view.clone();
            }
        }
        endpoints
    }

    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("server.base_url", &self.server.base_url)?;

        if let Some(ttl) = self.notifications.as_ref().and_then(|n| n.ttl_ms) {
            crate::utils::validation::validate_positive_number("notifications.ttl_ms", ttl, 1)?;
        }

        let endpoints = self.endpoints();
        for (field, template) in [
            ("endpoints.add", &endpoints.add),
            ("endpoints.update", &endpoints.update),
            ("endpoints.remove", &endpoints.remove),
        ] {
            if !template.contains("{id}") {
                return Err(CartError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: template.clone(),
                    reason: "Endpoint must contain the {id} placeholder".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.server.base_url
    }

    fn csrf_token(&self) -> Option<&str> {
        self.server.csrf_token.as_deref()
    }

    fn notification_ttl(&self) -> Duration {
        self.notifications
            .as_ref()
            .and_then(|n| n.ttl_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_NOTIFICATION_TTL)
    }

    fn success_revert(&self) -> Duration {
        self.dispatch
            .as_ref()
            .and_then(|d| d.success_revert_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SUCCESS_REVERT)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[server]
base_url = "http://127.0.0.1:8000"
"#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
        assert_eq!(config.csrf_token(), None);
        assert_eq!(config.notification_ttl(), Duration::from_millis(5000));
        assert_eq!(config.success_revert(), Duration::from_millis(2000));
        assert_eq!(config.endpoints(), Endpoints::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = TomlConfig::from_toml_str(
            r#"
[server]
base_url = "https://libreria.example.com"
csrf_token = "fixed"

[endpoints]
add = "/api/cart/{id}/add/"

[notifications]
ttl_ms = 3000

[dispatch]
success_revert_ms = 1000
"#,
        )
        .unwrap();

        assert_eq!(config.csrf_token(), Some("fixed"));
        assert_eq!(config.endpoints().add, "/api/cart/{id}/add/");
        assert_eq!(config.endpoints().remove, "/eliminar-carrito/{id}/");
        assert_eq!(config.notification_ttl(), Duration::from_millis(3000));
        assert_eq!(config.success_revert(), Duration::from_millis(1000));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VENTA_CART_TEST_TOKEN", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[server]
base_url = "http://127.0.0.1:8000"
csrf_token = "${VENTA_CART_TEST_TOKEN}"
"#,
        )
        .unwrap();
        assert_eq!(config.csrf_token(), Some("from-env"));

        std::env::remove_var("VENTA_CART_TEST_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let bad_url = TomlConfig::from_toml_str("[server]\nbase_url = \"invalid-url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let bad_endpoint = TomlConfig::from_toml_str(
            "[server]\nbase_url = \"http://localhost\"\n[endpoints]\nremove = \"/eliminar/\"\n",
        )
        .unwrap();
        assert!(matches!(
            bad_endpoint.validate(),
            Err(CartError::InvalidConfigValueError { .. })
        ));

        let zero_ttl = TomlConfig::from_toml_str(
            "[server]\nbase_url = \"http://localhost\"\n[notifications]\nttl_ms = 0\n",
        )
        .unwrap();
        assert!(zero_ttl.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbase_url = \"http://tienda.local\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.base_url(), "http://tienda.local");
    }
}
