//! Geometry kernel abstraction
//!
//! Provides a unified interface over the shape backends:
//! - the expression-tree CSG kernel (always available)
//! - Truck (pure Rust B-Rep, behind the `truck` feature)

mod csg;
mod polygon;
mod traits;

#[cfg(feature = "truck")]
mod truck;

pub use csg::{CsgKernel, EXCHANGE_FORMAT, EXCHANGE_VERSION, ExchangeDocument, ShapeNode};
pub use polygon::{area as polygon_area, are_coplanar, clip_convex, newell_normal};
pub use traits::*;

#[cfg(feature = "truck")]
pub use truck::TruckKernel;
