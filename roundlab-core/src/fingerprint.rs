//! Strategy fingerprinting — deterministic identification of configurations.
//!
//! - `ComponentConfig`: one signal generator and its parameters.
//! - `StrategyConfig`: primary signal plus the optional cooldown fallback.
//! - `structure_hash`: generator types only, for grouping sweep results.
//! - `config_hash`: strategy + engine parameters, for exact identity.

use crate::domain::ConfigHash;
use crate::engine::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative description of one signal generator.
///
/// Uses `BTreeMap` for deterministic key ordering during serialization → hashing.
/// `members` is only meaningful for composite generators (`confluence`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentConfig {
    #[serde(rename = "type", alias = "component_type")]
    pub component_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ComponentConfig>,
}

impl ComponentConfig {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            params: BTreeMap::new(),
            members: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn with_member(mut self, member: ComponentConfig) -> Self {
        self.members.push(member);
        self
    }

    /// `type` for leaves, `type(member+member)` for composites.
    pub fn structure(&self) -> String {
        if self.members.is_empty() {
            return self.component_type.clone();
        }
        let inner: Vec<String> = self.members.iter().map(ComponentConfig::structure).collect();
        format!("{}({})", self.component_type, inner.join("+"))
    }
}

/// Primary signal and the generator used during cooldown under the fallback policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    pub signal: ComponentConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ComponentConfig>,
}

impl StrategyConfig {
    pub fn new(signal: ComponentConfig) -> Self {
        Self {
            signal,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: ComponentConfig) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Structural hash: generator types only, ignoring parameter values.
    pub fn structure_hash(&self) -> ConfigHash {
        let fallback = self
            .fallback
            .as_ref()
            .map(ComponentConfig::structure)
            .unwrap_or_else(|| "none".into());
        let structural = format!("{}|{}", self.signal.structure(), fallback);
        ConfigHash::from_bytes(structural.as_bytes())
    }

    /// Full hash over strategy and engine parameters.
    ///
    /// Canonical serialization: struct fields in declaration order, map keys
    /// sorted (BTreeMap).
    pub fn config_hash(&self, engine: &EngineConfig) -> ConfigHash {
        #[derive(Serialize)]
        struct Canonical<'a> {
            strategy: &'a StrategyConfig,
            engine: &'a EngineConfig,
        }
        // Only string-keyed maps and plain fields: serialization cannot fail.
        let json = serde_json::to_string(&Canonical {
            strategy: self,
            engine,
        })
        .expect("strategy and engine config must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StrategyConfig {
        StrategyConfig::new(ComponentConfig::new("crowd_contrarian").with_param("min_payout", 1.45))
            .with_fallback(ComponentConfig::new("mean_reversion").with_param("period", 20.0))
    }

    #[test]
    fn structure_hash_ignores_params() {
        let a = sample();
        let mut b = sample();
        b.signal.params.insert("min_payout".into(), 1.8);
        assert_eq!(a.structure_hash(), b.structure_hash());
        let engine = EngineConfig::default();
        assert_ne!(a.config_hash(&engine), b.config_hash(&engine));
    }

    #[test]
    fn structure_hash_sees_fallback_and_members() {
        let a = sample();
        let b = StrategyConfig::new(a.signal.clone());
        assert_ne!(a.structure_hash(), b.structure_hash());

        let c = StrategyConfig::new(
            ComponentConfig::new("confluence")
                .with_member(ComponentConfig::new("momentum"))
                .with_member(ComponentConfig::new("trend_follow")),
        );
        assert_eq!(c.signal.structure(), "confluence(momentum+trend_follow)");
    }

    #[test]
    fn config_hash_covers_engine() {
        let s = sample();
        let base = EngineConfig::default();
        let tweaked = EngineConfig {
            loss_threshold: 5,
            ..EngineConfig::default()
        };
        assert_ne!(s.config_hash(&base), s.config_hash(&tweaked));
        assert_eq!(s.config_hash(&base), s.config_hash(&base));
    }

    #[test]
    fn toml_style_type_key_roundtrip() {
        let json = r#"{"type":"momentum","params":{"fast_period":3.0}}"#;
        let c: ComponentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.component_type, "momentum");
        assert!(c.members.is_empty());
        let back: ComponentConfig = serde_json::from_str(&serde_json::to_string(&c).unwrap()).unwrap();
        assert_eq!(c, back);
    }
}
