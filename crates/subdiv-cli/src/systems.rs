//! Built-in dynamical systems the CLI can cover.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use subdiv_core::{DynamicalSystem, Interval, MapError};

/// Catalogue entry: name, description, parameters with defaults, and the
/// domain used when none is given.
pub struct SystemInfo {
    pub name: &'static str,
    pub summary: &'static str,
    pub params: &'static [(&'static str, f64)],
    pub domain: &'static [(f64, f64)],
}

pub const CATALOGUE: &[SystemInfo] = &[
    SystemInfo {
        name: "identity",
        summary: "identity map on the plane",
        params: &[],
        domain: &[(0.0, 1.0), (0.0, 1.0)],
    },
    SystemInfo {
        name: "logistic",
        summary: "logistic map x -> r x (1 - x)",
        params: &[("r", 3.8)],
        domain: &[(0.0, 1.0)],
    },
    SystemInfo {
        name: "henon",
        summary: "Hénon map (x, y) -> (1 - a x^2 + y, b x)",
        params: &[("a", 1.4), ("b", 0.3)],
        domain: &[(-1.5, 1.5), (-0.4, 0.4)],
    },
    SystemInfo {
        name: "lorenz",
        summary: "Lorenz flow sampled every `time` units (RK4, fixed step)",
        params: &[
            ("sigma", 10.0),
            ("rho", 28.0),
            ("beta", 8.0 / 3.0),
            ("time", 0.2),
            ("step", 0.01),
        ],
        domain: &[(-25.0, 25.0), (-30.0, 30.0), (0.0, 55.0)],
    },
];

pub fn lookup(name: &str) -> Option<&'static SystemInfo> {
    CATALOGUE.iter().find(|s| s.name == name)
}

#[derive(Clone, Debug, PartialEq)]
pub enum BuiltinSystem {
    Identity,
    Logistic { r: f64 },
    Henon { a: f64, b: f64 },
    Lorenz { sigma: f64, rho: f64, beta: f64, time: f64, step: f64 },
}

impl BuiltinSystem {
    /// Build a system from its name, overriding defaults with `overrides`.
    pub fn from_name(name: &str, overrides: &BTreeMap<String, f64>) -> Result<Self> {
        let Some(info) = lookup(name) else {
            let known: Vec<&str> = CATALOGUE.iter().map(|s| s.name).collect();
            bail!("unknown system '{name}' (known: {})", known.join(", "));
        };
        for key in overrides.keys() {
            if !info.params.iter().any(|(k, _)| k == key) {
                let known: Vec<&str> = info.params.iter().map(|(k, _)| *k).collect();
                bail!(
                    "system '{name}' has no parameter '{key}' (parameters: {})",
                    if known.is_empty() { "none".to_string() } else { known.join(", ") }
                );
            }
        }
        let param = |key: &str| -> f64 {
            overrides.get(key).copied().unwrap_or_else(|| {
                info.params
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map_or(f64::NAN, |(_, v)| *v)
            })
        };

        let system = match name {
            "identity" => Self::Identity,
            "logistic" => Self::Logistic { r: param("r") },
            "henon" => Self::Henon {
                a: param("a"),
                b: param("b"),
            },
            "lorenz" => {
                let (time, step) = (param("time"), param("step"));
                if !(time > 0.0 && step > 0.0) {
                    bail!("lorenz requires time > 0 and step > 0 (got time={time}, step={step})");
                }
                Self::Lorenz {
                    sigma: param("sigma"),
                    rho: param("rho"),
                    beta: param("beta"),
                    time,
                    step,
                }
            }
            _ => bail!("system '{name}' is listed but has no constructor"),
        };
        Ok(system)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Logistic { .. } => "logistic",
            Self::Henon { .. } => "henon",
            Self::Lorenz { .. } => "lorenz",
        }
    }

    pub fn default_domain(&self) -> Vec<Interval> {
        lookup(self.name())
            .map(|info| info.domain.iter().map(|&(lo, hi)| Interval::new(lo, hi)).collect())
            .unwrap_or_default()
    }
}

impl DynamicalSystem for BuiltinSystem {
    fn dimension(&self) -> usize {
        match self {
            Self::Identity => 2,
            Self::Logistic { .. } => 1,
            Self::Henon { .. } => 2,
            Self::Lorenz { .. } => 3,
        }
    }

    fn map_point(&self, p: &[f64]) -> Result<Vec<f64>, MapError> {
        if p.len() != self.dimension() {
            return Err(MapError::new(format!(
                "{} expects {} coordinates, got {}",
                self.name(),
                self.dimension(),
                p.len()
            )));
        }
        let image = match *self {
            Self::Identity => p.to_vec(),
            Self::Logistic { r } => vec![r * p[0] * (1.0 - p[0])],
            Self::Henon { a, b } => vec![1.0 - a * p[0] * p[0] + p[1], b * p[0]],
            Self::Lorenz {
                sigma,
                rho,
                beta,
                time,
                step,
            } => {
                let field = |s: [f64; 3]| {
                    [
                        sigma * (s[1] - s[0]),
                        s[0] * (rho - s[2]) - s[1],
                        s[0] * s[1] - beta * s[2],
                    ]
                };
                rk4(field, [p[0], p[1], p[2]], time, step).to_vec()
            }
        };
        Ok(image)
    }
}

/// Integrate `x' = f(x)` for `time` with classical Runge–Kutta. The last step
/// is shortened to land exactly on `time`.
fn rk4(f: impl Fn([f64; 3]) -> [f64; 3], mut state: [f64; 3], time: f64, step: f64) -> [f64; 3] {
    let axpy = |a: [f64; 3], h: f64, d: [f64; 3]| [a[0] + h * d[0], a[1] + h * d[1], a[2] + h * d[2]];
    let mut t = 0.0;
    while t < time {
        let h = step.min(time - t);
        let k1 = f(state);
        let k2 = f(axpy(state, h / 2.0, k1));
        let k3 = f(axpy(state, h / 2.0, k2));
        let k4 = f(axpy(state, h, k3));
        for i in 0..3 {
            state[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }
        t += h;
    }
    state
}
