//! Service configuration from environment.

use std::env;
use std::time::Duration;

use skyhaul_core::rules::DEFAULT_SAMPLES_PER_SEGMENT;
use skyhaul_core::{PlanningRules, ProjectionMode};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub advisor_url: String,
    pub advisor_enabled: bool,
    pub advisor_timeout_ms: u64,
    /// Empty disables road geometry
    pub directions_url: String,
    pub directions_timeout_ms: u64,
    pub leg_prediction_enabled: bool,
    pub wind_speed_mps: f64,
    pub samples_per_segment: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            advisor_url: lookup("SKYHAUL_ADVISOR_URL")
                .unwrap_or_else(|| "http://localhost:5001".to_string()),
            advisor_enabled: lookup("SKYHAUL_ADVISOR_ENABLED")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            advisor_timeout_ms: lookup("SKYHAUL_ADVISOR_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1500),
            directions_url: lookup("SKYHAUL_DIRECTIONS_URL").unwrap_or_default(),
            directions_timeout_ms: lookup("SKYHAUL_DIRECTIONS_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(2500),
            leg_prediction_enabled: lookup("SKYHAUL_LEG_PREDICTION_ENABLED")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            wind_speed_mps: lookup("SKYHAUL_WIND_SPEED_MPS")
                .and_then(|s| s.parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(5.0),
            samples_per_segment: lookup("SKYHAUL_SAMPLES_PER_SEGMENT")
                .and_then(|s| s.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(DEFAULT_SAMPLES_PER_SEGMENT),
        }
    }

    pub fn advisor_timeout(&self) -> Duration {
        Duration::from_millis(self.advisor_timeout_ms.max(1))
    }

    pub fn directions_timeout(&self) -> Duration {
        Duration::from_millis(self.directions_timeout_ms.max(1))
    }

    pub fn directions_enabled(&self) -> bool {
        !self.directions_url.trim().is_empty()
    }

    pub fn planning_rules(&self) -> PlanningRules {
        PlanningRules::default().with_projection(ProjectionMode::Sampled {
            samples_per_segment: self.samples_per_segment,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let config = Config::default();
        assert_eq!(config.advisor_url, "http://localhost:5001");
        assert!(config.advisor_enabled);
        assert_eq!(config.advisor_timeout(), Duration::from_millis(1500));
        assert!(!config.directions_enabled());
        assert_eq!(config.wind_speed_mps, 5.0);
        assert_eq!(config.samples_per_segment, 50);
    }

    #[test]
    fn overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SKYHAUL_ADVISOR_ENABLED", "off"),
            ("SKYHAUL_DIRECTIONS_URL", "http://osrm:5000"),
            ("SKYHAUL_WIND_SPEED_MPS", "-3"),
            ("SKYHAUL_SAMPLES_PER_SEGMENT", "0"),
            ("SKYHAUL_ADVISOR_TIMEOUT_MS", "250"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert!(!config.advisor_enabled);
        assert!(config.directions_enabled());
        assert_eq!(config.wind_speed_mps, 5.0);
        assert_eq!(config.samples_per_segment, 50);
        assert_eq!(config.advisor_timeout_ms, 250);
        assert!(config.planning_rules().validate().is_empty());
    }
}
