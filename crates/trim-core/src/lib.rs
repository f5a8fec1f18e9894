//! Trimmed solid reconstruction
//!
//! This crate provides:
//! - Curve and primitive data model with JSON loading
//! - Curve-to-primitive classification
//! - Trimming of curves into faces, cylinders and lofts
//! - Coplanar patch grouping and cube assembly
//! - STL and exchange file export

pub mod assemble;
pub mod classify;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod export;
pub mod grouping;
pub mod input;
pub mod primitive;
pub mod trim;

pub use assemble::{
    AssembledModel, AssemblyReport, SkipReason, SkippedCurve, trim_cube, trim_face, trim_object,
};
pub use classify::{ClassifiedCurve, classify, classify_network};
pub use config::{ConfigError, CubeFace, ToleranceSource, TrimConfig};
pub use curve::{
    Curve, CurveEnds, CurveNetwork, FittedCircle, classify_open_closed, fit_circle,
    representative_point,
};
pub use error::TrimError;
pub use export::{ExportError, export_exchange, export_stl, save_stl};
pub use grouping::{NormalKey, bucket_by_normal, merge_coplanar_patches};
pub use input::{InputError, load_curve_network, load_primitives};
pub use primitive::{Cylinder, Plane, Primitive, PrimitiveKind, Surface};
pub use trim::{PlanarPatch, TrimmedPatch, Trimmer};
