use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What a drain does after an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainPolicySetting {
    /// Record the failure and run the next operation.
    #[default]
    Continue,
    /// Stop at the first failure; the rest of the queue is skipped.
    Abort,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CanvasConfig {
    pub version: u32,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub drain: DrainSection,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub particles: ParticleSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerSection {
    #[serde(default = "default_min_interval_ticks")]
    pub min_interval_ticks: u64,
    #[serde(
        default = "default_wake_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub wake_delay: Duration,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DrainSection {
    #[serde(default)]
    pub policy: DrainPolicySetting,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphSection {
    #[serde(default = "default_graph_width")]
    pub width: u32,
    #[serde(default = "default_graph_height")]
    pub height: u32,
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default = "default_point_radius")]
    pub point_radius: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParticleSection {
    #[serde(default = "default_particle_count")]
    pub count: usize,
    #[serde(default = "default_particle_extent")]
    pub width: u32,
    #[serde(default = "default_particle_extent")]
    pub height: u32,
}

fn default_min_interval_ticks() -> u64 {
    30
}

fn default_wake_delay() -> Duration {
    Duration::from_millis(60)
}

fn default_graph_width() -> u32 {
    800
}

fn default_graph_height() -> u32 {
    400
}

fn default_padding() -> u32 {
    40
}

fn default_point_radius() -> f64 {
    3.0
}

fn default_particle_count() -> usize {
    10
}

fn default_particle_extent() -> u32 {
    300
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            min_interval_ticks: default_min_interval_ticks(),
            wake_delay: default_wake_delay(),
        }
    }
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            width: default_graph_width(),
            height: default_graph_height(),
            padding: default_padding(),
            point_radius: default_point_radius(),
        }
    }
}

impl Default for ParticleSection {
    fn default() -> Self {
        Self {
            count: default_particle_count(),
            width: default_particle_extent(),
            height: default_particle_extent(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            version: 1,
            scheduler: SchedulerSection::default(),
            drain: DrainSection::default(),
            graph: GraphSection::default(),
            particles: ParticleSection::default(),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of milliseconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_millis(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_millis(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be a finite, non-negative number"));
            }
            Duration::try_from_secs_f64(v / 1000.0)
                .map_err(|err| E::custom(format!("duration {v}ms is out of range: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl CanvasConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CanvasConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.scheduler.wake_delay.is_zero() {
            return Err(ConfigError::Invalid(
                "scheduler.wake_delay must be greater than zero".into(),
            ));
        }

        let graph = &self.graph;
        if graph.width == 0 || graph.height == 0 {
            return Err(ConfigError::Invalid(
                "graph dimensions must be greater than zero".into(),
            ));
        }
        if graph.padding.saturating_mul(2) >= graph.width.min(graph.height) {
            return Err(ConfigError::Invalid(format!(
                "graph padding {} leaves no room inside {}x{}",
                graph.padding, graph.width, graph.height
            )));
        }
        if !(graph.point_radius.is_finite() && graph.point_radius > 0.0) {
            return Err(ConfigError::Invalid(
                "graph.point_radius must be a positive number".into(),
            ));
        }

        let particles = &self.particles;
        if particles.width == 0 || particles.height == 0 {
            return Err(ConfigError::Invalid(
                "particle field dimensions must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[scheduler]
min_interval_ticks = 16
wake_delay = "40ms"

[drain]
policy = "abort"

[graph]
width = 640
height = 320
padding = 20
point_radius = 2.5

[particles]
count = 25
"#;

    #[test]
    fn parses_sample_config() {
        let config = CanvasConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.scheduler.min_interval_ticks, 16);
        assert_eq!(config.scheduler.wake_delay, Duration::from_millis(40));
        assert_eq!(config.drain.policy, DrainPolicySetting::Abort);
        assert_eq!(config.graph.width, 640);
        assert_eq!(config.graph.padding, 20);
        assert_eq!(config.particles.count, 25);
        assert_eq!(config.particles.width, 300);
    }

    #[test]
    fn sections_default_when_absent() {
        let config = CanvasConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.scheduler.min_interval_ticks, 30);
        assert_eq!(config.scheduler.wake_delay, Duration::from_millis(60));
        assert_eq!(config.drain.policy, DrainPolicySetting::Continue);
        assert_eq!(config.graph.width, 800);
        assert_eq!(config.graph.height, 400);
    }

    #[test]
    fn numeric_wake_delay_is_milliseconds() {
        let config = CanvasConfig::from_toml_str(
            r#"
version = 1
[scheduler]
wake_delay = 75
"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.wake_delay, Duration::from_millis(75));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = CanvasConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_padding_that_swallows_graph() {
        let err = CanvasConfig::from_toml_str(
            r#"
version = 1
[graph]
width = 100
height = 60
padding = 30
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = CanvasConfig::from_toml_str(
            r#"
version = 1
[drain]
policy = "sometimes"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_infinite_wake_delay() {
        for delay in ["inf", "1e30", "-5.0"] {
            let input = format!("version = 1\n[scheduler]\nwake_delay = {delay}\n");
            let err = CanvasConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{delay}: {err}");
        }
    }

    #[test]
    fn float_wake_delay_is_milliseconds() {
        let input = "version = 1\n[scheduler]\nwake_delay = 250.0\n";
        let config = CanvasConfig::from_toml_str(input).unwrap();
        assert_eq!(config.scheduler.wake_delay, Duration::from_millis(250));
    }
}
