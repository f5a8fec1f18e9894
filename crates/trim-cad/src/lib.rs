//! Geometry Kernel Abstraction
//!
//! This crate provides:
//! - Abstract geometry kernel trait used by the trimming engine
//! - An exact expression-tree CSG backend with tessellation and RON exchange
//! - An optional Truck B-Rep backend
//! - Vector helpers for plane, axis and parallelism tests

pub mod kernel;
pub mod math;

// Re-exports for convenience
pub use kernel::{
    BooleanType, CadError, CadResult, CsgKernel, GeometryKernel, NullKernel, Shape, ShapeKind,
    ShapeNode, TessellatedMesh, Wire3D, default_kernel, kernel_by_name, sample_matched,
};
pub use math::ARITHMETIC_TOLERANCE;
