//! Run configuration: TOML file, overlaid by command-line flags, falling back
//! to the chosen system's defaults.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use subdiv_core::{DEFAULT_SAMPLES_PER_DIMENSION, Domain, Interval, SEED_DEPTH};

use crate::systems::BuiltinSystem;

/// Every field optional so files and flags can each supply a subset.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub system: Option<String>,
    pub depth: Option<u32>,
    pub domain: Option<Vec<[f64; 2]>>,
    pub samples: Option<usize>,
    pub seed_depth: Option<u32>,
    pub parallel: Option<bool>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Values set in `other` win; params are merged key by key.
    pub fn overlay(mut self, other: RunConfig) -> Self {
        self.system = other.system.or(self.system);
        self.depth = other.depth.or(self.depth);
        self.domain = other.domain.or(self.domain);
        self.samples = other.samples.or(self.samples);
        self.seed_depth = other.seed_depth.or(self.seed_depth);
        self.parallel = other.parallel.or(self.parallel);
        self.params.extend(other.params);
        self
    }

    pub fn resolve(self) -> Result<RunSettings> {
        let Some(name) = self.system else {
            bail!("no system given (use --system or set `system` in the config file)");
        };
        let Some(depth) = self.depth else {
            bail!("no target depth given (use --depth or set `depth` in the config file)");
        };
        let system = BuiltinSystem::from_name(&name, &self.params)?;
        let intervals = match self.domain {
            Some(bounds) => bounds.iter().map(|&[lo, hi]| Interval::new(lo, hi)).collect(),
            None => system.default_domain(),
        };
        let domain = Domain::new(intervals).context("invalid domain")?;
        Ok(RunSettings {
            system,
            domain,
            depth,
            samples: self.samples.unwrap_or(DEFAULT_SAMPLES_PER_DIMENSION),
            seed_depth: self.seed_depth.unwrap_or(SEED_DEPTH),
            parallel: self.parallel.unwrap_or(true),
        })
    }
}

/// Fully resolved inputs for one run.
#[derive(Debug)]
pub struct RunSettings {
    pub system: BuiltinSystem,
    pub domain: Domain,
    pub depth: u32,
    pub samples: usize,
    pub seed_depth: u32,
    pub parallel: bool,
}

/// Parse `"min,max;min,max;..."`.
pub fn parse_domain(s: &str) -> Result<Vec<[f64; 2]>, String> {
    s.split(';')
        .map(|axis| -> Result<[f64; 2], String> {
            let (lo, hi) = axis
                .split_once(',')
                .ok_or_else(|| format!("axis '{axis}' is not 'min,max'"))?;
            let lo: f64 = lo.trim().parse().map_err(|e| format!("bad min '{lo}': {e}"))?;
            let hi: f64 = hi.trim().parse().map_err(|e| format!("bad max '{hi}': {e}"))?;
            Ok([lo, hi])
        })
        .collect()
}

/// Parse `key=value` with a numeric value.
pub fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("parameter '{s}' is not 'key=value'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for '{key}': {e}"))?;
    Ok((key.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain() {
        assert_eq!(
            parse_domain("-1.5,1.5;-0.4, 0.4").unwrap(),
            vec![[-1.5, 1.5], [-0.4, 0.4]]
        );
        assert!(parse_domain("0;1").is_err());
        assert!(parse_domain("a,1").is_err());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("a=1.2").unwrap(), ("a".to_string(), 1.2));
        assert!(parse_param("a").is_err());
        assert!(parse_param("a=x").is_err());
    }

    #[test]
    fn test_toml_round_trip_fields() {
        let cfg: RunConfig = toml::from_str(
            r#"
            system = "henon"
            depth = 9
            domain = [[-2.0, 2.0], [-0.5, 0.5]]
            parallel = false

            [params]
            a = 1.3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.system.as_deref(), Some("henon"));
        assert_eq!(cfg.depth, Some(9));
        assert_eq!(cfg.params.get("a"), Some(&1.3));
        assert_eq!(cfg.parallel, Some(false));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<RunConfig>("sytem = \"henon\"").is_err());
    }

    #[test]
    fn test_overlay_prefers_flags() {
        let file = RunConfig {
            system: Some("henon".into()),
            depth: Some(6),
            params: BTreeMap::from([("a".into(), 1.3), ("b".into(), 0.2)]),
            ..Default::default()
        };
        let flags = RunConfig {
            depth: Some(8),
            params: BTreeMap::from([("a".into(), 1.1)]),
            ..Default::default()
        };
        let merged = file.overlay(flags);
        assert_eq!(merged.system.as_deref(), Some("henon"));
        assert_eq!(merged.depth, Some(8));
        assert_eq!(merged.params["a"], 1.1);
        assert_eq!(merged.params["b"], 0.2);
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = RunConfig {
            system: Some("henon".into()),
            depth: Some(5),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(settings.domain.dimension(), 2);
        assert_eq!(settings.samples, DEFAULT_SAMPLES_PER_DIMENSION);
        assert_eq!(settings.seed_depth, SEED_DEPTH);
        assert!(settings.parallel);
    }

    #[test]
    fn test_resolve_requires_system_and_depth() {
        assert!(RunConfig::default().resolve().is_err());
        let no_depth = RunConfig {
            system: Some("henon".into()),
            ..Default::default()
        };
        assert!(no_depth.resolve().is_err());
    }

    #[test]
    fn test_resolve_rejects_inverted_domain() {
        let cfg = RunConfig {
            system: Some("logistic".into()),
            depth: Some(4),
            domain: Some(vec![[1.0, 0.0]]),
            ..Default::default()
        };
        let err = cfg.resolve().unwrap_err();
        assert!(format!("{err:#}").contains("invalid interval"));
    }
}
