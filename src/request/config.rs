use std::sync::RwLock;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::ConfigError;
use crate::request::request_item::{ConfigOverride, RequestConfig};

// 进程级默认配置。并发写入为 last-write-wins，正在进行的批次不受影响。
static GLOBAL_DEFAULTS: Lazy<RwLock<RequestConfig>> = Lazy::new(|| RwLock::new(RequestConfig::default()));

/// Replace the process-wide defaults.
pub fn init_defaults(config: RequestConfig) {
    let mut global = GLOBAL_DEFAULTS.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *global = config;
}

/// Snapshot of the process-wide defaults.
pub fn defaults() -> RequestConfig {
    GLOBAL_DEFAULTS.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

/// Shallow-merge `partial` into the process-wide defaults.
///
/// Dispatch calls snapshot the defaults once when they start. A call that
/// races with `set_defaults` may observe either value.
pub fn set_defaults(partial: &ConfigOverride) {
    let mut global = GLOBAL_DEFAULTS.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *global = global.merged(partial);
    tracing::debug!(endpoint = %global.endpoint, method = %global.method, "defaults updated");
}

/// Either one override shared by every slot or one override per slot.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideSpec {
    Single(ConfigOverride),
    PerSlot(Vec<ConfigOverride>),
}

impl Default for OverrideSpec {
    fn default() -> Self {
        OverrideSpec::Single(ConfigOverride::default())
    }
}

impl From<ConfigOverride> for OverrideSpec {
    fn from(layer: ConfigOverride) -> Self {
        OverrideSpec::Single(layer)
    }
}

impl From<Vec<ConfigOverride>> for OverrideSpec {
    fn from(layers: Vec<ConfigOverride>) -> Self {
        OverrideSpec::PerSlot(layers)
    }
}

impl OverrideSpec {
    /// Stack a batch-wide layer underneath every per-slot layer.
    pub fn over(self, batch: &ConfigOverride) -> OverrideSpec {
        match self {
            OverrideSpec::Single(layer) => OverrideSpec::Single(batch.then(&layer)),
            OverrideSpec::PerSlot(layers) => {
                OverrideSpec::PerSlot(layers.iter().map(|layer| batch.then(layer)).collect())
            }
        }
    }
}

/// Resolve one effective config per slot.
///
/// A per-slot list shorter than `n` is padded with its last entry; a longer
/// one is truncated.
pub fn resolve_configs(
    defaults: &RequestConfig,
    n: usize,
    spec: &OverrideSpec,
) -> Result<Vec<RequestConfig>, ConfigError> {
    if n < 1 {
        return Err(ConfigError::InvalidCount { count: 0 });
    }

    let configs: Vec<RequestConfig> = match spec {
        OverrideSpec::Single(layer) => {
            let config = defaults.merged(layer);
            vec![config; n]
        }
        OverrideSpec::PerSlot(layers) => {
            let last = layers.last().ok_or(ConfigError::EmptyOverrideList)?;
            (0..n)
                .map(|i| defaults.merged(layers.get(i).unwrap_or(last)))
                .collect()
        }
    };

    for (index, config) in configs.iter().enumerate() {
        validate_endpoint(index + 1, &config.endpoint)?;
    }

    Ok(configs)
}

fn validate_endpoint(slot: usize, endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.trim().is_empty() {
        return Err(ConfigError::MissingEndpoint { slot });
    }
    Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint {
        slot,
        endpoint: endpoint.to_owned(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::request_item::HttpMethod;
    use serde_json::json;

    fn base() -> RequestConfig {
        let mut config = RequestConfig::new("https://api.example/default");
        config.token = Some("default-token".to_owned());
        config
    }

    #[test]
    fn zero_slots_is_a_config_error() {
        let result = resolve_configs(&base(), 0, &OverrideSpec::default());
        assert!(matches!(result, Err(ConfigError::InvalidCount { .. })));
    }

    #[test]
    fn single_override_applies_to_every_slot() -> Result<(), ConfigError> {
        let spec = OverrideSpec::Single(ConfigOverride::new().method(HttpMethod::Put));
        let configs = resolve_configs(&base(), 3, &spec)?;
        assert_eq!(configs.len(), 3);
        for config in &configs {
            assert_eq!(config.method, HttpMethod::Put);
            assert_eq!(config.endpoint, "https://api.example/default");
            assert_eq!(config.token.as_deref(), Some("default-token"));
        }
        Ok(())
    }

    #[test]
    fn short_list_is_padded_with_last_entry() -> Result<(), ConfigError> {
        let a = ConfigOverride::new().body(json!({"slot": "a"}));
        let b = ConfigOverride::new().endpoint("https://api.example/b").body(json!({"slot": "b"}));
        let spec = OverrideSpec::PerSlot(vec![a.clone(), b.clone()]);

        let configs = resolve_configs(&base(), 5, &spec)?;
        let expected = [&a, &b, &b, &b, &b].map(|layer| base().merged(layer));
        assert_eq!(configs, expected.to_vec());
        Ok(())
    }

    #[test]
    fn long_list_is_truncated() -> Result<(), ConfigError> {
        let layers: Vec<ConfigOverride> = (0..4)
            .map(|i| ConfigOverride::new().body(json!({ "i": i })))
            .collect();
        let configs = resolve_configs(&base(), 2, &OverrideSpec::PerSlot(layers))?;
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[1].body, Some(json!({"i": 1})));
        Ok(())
    }

    #[test]
    fn empty_list_is_rejected() {
        let result = resolve_configs(&base(), 2, &OverrideSpec::PerSlot(Vec::new()));
        assert!(matches!(result, Err(ConfigError::EmptyOverrideList)));
    }

    #[test]
    fn endpoint_is_validated_per_slot() {
        let spec = OverrideSpec::PerSlot(vec![
            ConfigOverride::new(),
            ConfigOverride::new().endpoint("not a url"),
        ]);
        match resolve_configs(&base(), 2, &spec) {
            Err(ConfigError::InvalidEndpoint { slot, .. }) => assert_eq!(slot, 2),
            other => panic!("expected invalid endpoint, got {:?}", other),
        }

        let missing = resolve_configs(&RequestConfig::default(), 1, &OverrideSpec::default());
        assert!(matches!(missing, Err(ConfigError::MissingEndpoint { slot: 1 })));
    }

    #[test]
    fn batch_layer_sits_under_slot_layers() -> Result<(), ConfigError> {
        let batch = ConfigOverride::new().method(HttpMethod::Post).token("batch");
        let spec = OverrideSpec::PerSlot(vec![
            ConfigOverride::new().body(json!(1)),
            ConfigOverride::new().token("slot").body(json!(2)),
        ])
        .over(&batch);

        let configs = resolve_configs(&base(), 2, &spec)?;
        assert_eq!(configs[0].method, HttpMethod::Post);
        assert_eq!(configs[0].token.as_deref(), Some("batch"));
        assert_eq!(configs[1].token.as_deref(), Some("slot"));
        Ok(())
    }
}
