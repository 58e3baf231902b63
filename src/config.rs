use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::variography::{aggregator::MissingValues, surface::SurfaceColors};

/// Pair count below which a variogram value is considered unstable.
pub const DEFAULT_MIN_PAIRS: u64 = 30;

/// Parameters of a variogram computation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VariogramConfig {
    /// Fill gaps between observed coordinates with empty lattice cells.
    pub autofill: bool,
    /// Largest physical lag length; a third of the largest pairwise distance when unset.
    pub radius: Option<f64>,
    /// Minimum pair count for [`crate::variography::representations::Variogram::filter_unstable`].
    pub min_pairs: u64,
    pub missing: MissingValues,
    pub surface: SurfaceColors,
}

impl Default for VariogramConfig {
    fn default() -> Self {
        Self {
            autofill: true,
            radius: None,
            min_pairs: DEFAULT_MIN_PAIRS,
            missing: MissingValues::Ignore,
            surface: SurfaceColors::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<VariogramConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::variography::surface::Rgb;

    #[test]
    fn empty_object_gives_defaults() {
        let config: VariogramConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VariogramConfig::default());
        assert_eq!(config.surface.levels, 100);
    }

    #[test]
    fn partial_config() {
        let config: VariogramConfig = serde_json::from_str(
            r##"{
                "autofill": false,
                "radius": 12.5,
                "missing": "propagate",
                "surface": { "low": "#000000", "high": "#ffffff" }
            }"##,
        )
        .unwrap();
        assert!(!config.autofill);
        assert_eq!(config.radius, Some(12.5));
        assert_eq!(config.min_pairs, DEFAULT_MIN_PAIRS);
        assert_eq!(config.missing, MissingValues::Propagate);
        assert_eq!(config.surface.high, Rgb::new(255, 255, 255));
        assert_eq!(config.surface.levels, 100);
    }

    #[test]
    fn bad_colour_is_rejected() {
        let res: Result<VariogramConfig, _> =
            serde_json::from_str(r#"{ "surface": { "low": "blue" } }"#);
        assert!(res.is_err());
    }

    #[test]
    fn missing_file() {
        let err = load_config(Path::new("/nonexistent/resgram.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
