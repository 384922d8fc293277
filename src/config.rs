//! Server configuration. Everything has a default, so the server runs with no
//! config file at all; a TOML file and `VTON_*` environment variables can
//! override any field.

use anyhow::{anyhow, bail, Result};
use rand::Rng;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file, used when `VTON_CONFIG` is unset
pub const CONFIG_FILE: &str = "vton.toml";

/// Name reported by the health check
pub const SERVICE_NAME: &str = "Test VTON API";

/// Message reported by the discovery route
pub const SERVER_NAME: &str = "Test VTON API Server";

/// Font files tried in order before falling back to the built-in glyphs
pub const FONT_PATHS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:/Windows/Fonts/arial.ttf",
];

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSection,
    pub fetch: FetchSection,
    pub latency: LatencySection,
    pub render: RenderSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Outbound fetches of `person_url` / `garment_url`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: f64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self { timeout_secs: 10.0 }
    }
}

impl FetchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs.max(0.0))
    }
}

/// Bounds of the simulated model latency, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LatencySection {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for LatencySection {
    fn default() -> Self {
        Self {
            min_secs: 2.0,
            max_secs: 3.5,
        }
    }
}

impl LatencySection {
    /// Draw a delay uniformly from `[min_secs, max_secs]`
    pub fn sample(&self) -> Duration {
        let min = self.min_secs.max(0.0);
        let secs = if self.max_secs <= min {
            min
        } else {
            rand::thread_rng().gen_range(min..=self.max_secs)
        };
        Duration::from_secs_f64(secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// Canvas size used when the person image can't be measured
    pub default_width: u32,
    pub default_height: u32,
    /// Pixel height of caption text
    pub font_size: f32,
    pub font_paths: Vec<String>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            default_width: 512,
            default_height: 768,
            font_size: 24.0,
            font_paths: FONT_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl RenderSection {
    pub fn default_size(&self) -> (u32, u32) {
        (self.default_width.max(1), self.default_height.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info,vton_mock=debug".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the config file (if present) and environment
    pub fn load() -> Result<Self> {
        let path = env::var("VTON_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());

        let mut builder = config::Config::builder();
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("VTON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read the optional port override from the command line arguments (program
/// name already skipped). At most one argument is allowed.
pub fn port_arg<I: IntoIterator<Item = String>>(args: I) -> Result<Option<u16>> {
    let mut args = args.into_iter();
    let Some(port) = args.next() else {
        return Ok(None);
    };
    if args.next().is_some() {
        bail!("too many arguments");
    }

    let port = port.parse().map_err(|_| anyhow!("invalid port {port:?}"))?;
    Ok(Some(port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(settings.render.default_size(), (512, 768));
        assert_eq!(settings.render.font_paths.len(), 3);
    }

    #[test]
    fn test_latency_within_bounds() {
        let latency = LatencySection::default();
        for _ in 0..100 {
            let d = latency.sample().as_secs_f64();
            assert!((2.0..=3.5).contains(&d), "latency {d} out of range");
        }
    }

    #[test]
    fn test_latency_degenerate_range() {
        let latency = LatencySection {
            min_secs: 0.5,
            max_secs: 0.1,
        };
        assert_eq!(latency.sample(), Duration::from_millis(500));

        let zero = LatencySection {
            min_secs: 0.0,
            max_secs: 0.0,
        };
        assert_eq!(zero.sample(), Duration::ZERO);
    }

    #[test]
    fn test_port_arg() {
        let args = |list: &[&str]| list.iter().map(|a| a.to_string()).collect::<Vec<_>>();

        assert_eq!(port_arg(args(&[])).unwrap(), None);
        assert_eq!(port_arg(args(&["9000"])).unwrap(), Some(9000));
        assert!(port_arg(args(&["http"])).is_err());
        assert!(port_arg(args(&["70000"])).is_err());
        assert!(port_arg(args(&["9000", "9001"])).is_err());
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 9001\n[latency]\nmax_secs = 1.0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.latency.max_secs, 1.0);
        assert_eq!(settings.latency.min_secs, 2.0);
        assert_eq!(settings.render.default_width, 512);
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../vton.example.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let defaults = Settings::default();

        assert_eq!(settings.bind_addr(), defaults.bind_addr());
        assert_eq!(settings.fetch.timeout(), defaults.fetch.timeout());
        assert_eq!(settings.render.font_paths, defaults.render.font_paths);
        assert_eq!(settings.logging.level, defaults.logging.level);
    }
}
