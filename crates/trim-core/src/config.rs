//! Pipeline configuration file (RON)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ARITHMETIC_TOLERANCE, CONFIG_VERSION, CURVES_PER_FACE, DEFAULT_STL_TOLERANCE,
};
use crate::primitive::Primitive;

/// Which tolerance the classifier uses for containment tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToleranceSource {
    /// Each primitive's own fit tolerance
    #[default]
    PerPrimitive,
    /// The arithmetic tolerance for every primitive
    Uniform,
}

/// A cube face and the curves bounding it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeFace {
    pub name: String,
    pub curves: Vec<usize>,
}

impl CubeFace {
    pub fn new(name: impl Into<String>, curves: &[usize]) -> Self {
        Self {
            name: name.into(),
            curves: curves.to_vec(),
        }
    }
}

/// Configuration for classification, trimming and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// File format version
    pub version: u32,
    /// Parallelism threshold and normal bucketing resolution
    pub arithmetic_tolerance: f64,
    pub tolerance_source: ToleranceSource,
    /// Chordal tolerance for STL meshing
    pub stl_tolerance: f64,
    /// Log every construction with its parameters
    pub trace_constructions: bool,
    /// Cube faces, unioned pairwise in this order
    pub cube_faces: Vec<CubeFace>,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            arithmetic_tolerance: ARITHMETIC_TOLERANCE,
            tolerance_source: ToleranceSource::default(),
            stl_tolerance: DEFAULT_STL_TOLERANCE,
            trace_constructions: false,
            cube_faces: default_cube_faces(),
        }
    }
}

/// Face table of the reference cube data
pub fn default_cube_faces() -> Vec<CubeFace> {
    vec![
        CubeFace::new("front", &[2, 3, 4, 5]),
        CubeFace::new("back", &[9, 12, 20, 21]),
        CubeFace::new("top", &[2, 8, 9, 10]),
        CubeFace::new("bottom", &[3, 11, 12, 13]),
        CubeFace::new("right", &[4, 8, 11, 20]),
        CubeFace::new("left", &[10, 13, 21, 5]),
    ]
}

impl TrimConfig {
    /// Containment tolerance for a primitive
    pub fn tolerance_for(&self, primitive: &Primitive) -> f64 {
        match self.tolerance_source {
            ToleranceSource::PerPrimitive => primitive
                .tolerance
                .unwrap_or(self.arithmetic_tolerance),
            ToleranceSource::Uniform => self.arithmetic_tolerance,
        }
    }

    /// Sorted, deduplicated curve indices used by the cube faces
    pub fn cube_curves(&self) -> Vec<usize> {
        let mut curves: Vec<usize> = self
            .cube_faces
            .iter()
            .flat_map(|f| f.curves.iter().copied())
            .collect();
        curves.sort_unstable();
        curves.dedup();
        curves
    }

    /// Check values the pipeline relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arithmetic_tolerance.is_nan() || self.arithmetic_tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "arithmetic_tolerance must be positive, got {}",
                self.arithmetic_tolerance
            )));
        }
        if self.stl_tolerance.is_nan() || self.stl_tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "stl_tolerance must be positive, got {}",
                self.stl_tolerance
            )));
        }
        if self.cube_faces.is_empty() {
            return Err(ConfigError::Invalid("no cube faces configured".into()));
        }
        for face in &self.cube_faces {
            if face.curves.len() != CURVES_PER_FACE {
                return Err(ConfigError::Invalid(format!(
                    "face '{}' has {} curves (expected {})",
                    face.name,
                    face.curves.len(),
                    CURVES_PER_FACE
                )));
            }
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load and validate configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse and validate configuration from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: TrimConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
