use crate::config::HostConfig;
use crate::utils::errors::{HostError, HostResult};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Prefix for environment overrides, e.g. `NSHOST_RUNTIME__REPEAT=2`
pub const ENV_PREFIX: &str = "NSHOST_";

/// Layered configuration loader: defaults, TOML file, environment
pub struct ConfigManager {
    path: Option<PathBuf>,
    figment: Figment,
}

impl ConfigManager {
    /// Build the provider stack; `path` may point at a file that does not exist
    pub fn new(path: Option<&Path>) -> Self {
        let mut figment = Figment::from(Serialized::defaults(HostConfig::default()));

        if let Some(path) = path {
            if path.exists() {
                debug!("Loading config file {}", path.display());
            } else {
                debug!("Config file {} not found, using defaults", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self {
            path: path.map(Path::to_path_buf),
            figment,
        }
    }

    /// Config file this manager reads, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Extract and validate the merged configuration
    pub fn load(&self) -> HostResult<HostConfig> {
        let config: HostConfig = self.figment.extract()?;
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &HostConfig) -> HostResult<()> {
        config.validate().map_err(|errors| {
            let mut messages: Vec<String> = Vec::new();
            collect_messages("", &errors, &mut messages);
            HostError::Config(messages.join("; "))
        })
    }

    /// Render a config back to TOML
    pub fn to_toml(config: &HostConfig) -> HostResult<String> {
        toml::to_string_pretty(config).map_err(|e| HostError::Config(e.to_string()))
    }
}

fn collect_messages(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(format!("{}: {}", path, error.code));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_nested_field() {
        let mut config = HostConfig::default();
        config.runtime.repeat = 0;

        let err = ConfigManager::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("runtime.repeat"), "{}", message);
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_path_is_optional() {
        assert!(ConfigManager::new(None).path().is_none());
        let manager = ConfigManager::new(Some(Path::new("/nonexistent/nshost.toml")));
        assert_eq!(manager.path(), Some(Path::new("/nonexistent/nshost.toml")));
        assert_eq!(manager.load().unwrap().runtime.repeat, 1);
    }

    #[test]
    fn test_to_toml_skips_unset_paths() {
        let rendered = ConfigManager::to_toml(&HostConfig::default()).unwrap();
        assert!(rendered.contains("entry_script = \"App/main.js\""));
        assert!(!rendered.contains("base_dir"));
    }
}
