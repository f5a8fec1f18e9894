//! Global constants for trim-core

pub use trim_cad::math::ARITHMETIC_TOLERANCE;

/// Chordal tolerance used when meshing the assembled model for STL output
pub const DEFAULT_STL_TOLERANCE: f64 = 0.001;

/// Configuration file format version
pub const CONFIG_VERSION: u32 = 1;

/// Number of curves bounding one cube face
pub const CURVES_PER_FACE: usize = 4;

/// Number of coplanar patches a bucket needs to be merged into a face
pub const PATCHES_PER_BUCKET: usize = 4;

/// Default primitive list location
pub const DEFAULT_SURFACES_PATH: &str = "input_data/surface_info.json";

/// Default curve network location
pub const DEFAULT_CURVES_PATH: &str = "input_data/topo.json";

/// Default exchange file output
pub const DEFAULT_EXCHANGE_PATH: &str = "trimmed.step.ron";

/// Default STL output
pub const DEFAULT_STL_PATH: &str = "trimmed.stl";
