//! Trimming pipeline errors

use trim_cad::CadError;

/// Errors raised while classifying, trimming or assembling curves
///
/// Curve and primitive ids are input indices.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrimError {
    #[error("Curve {curve} is malformed: {endpoints} endpoints (expected 0 or 2)")]
    MalformedCurve { curve: usize, endpoints: usize },

    #[error("Curve {curve} does not lie on any primitive")]
    UnclassifiedCurve { curve: usize },

    #[error("Curve {curve}: unsupported primitive combination {primitives:?}")]
    UnsupportedPrimitiveCombination { curve: usize, primitives: Vec<usize> },

    #[error("Face '{face}' produced {patches} merged patches (expected 2)")]
    IncompleteFaceGroup { face: String, patches: usize },

    #[error("Face '{face}' references missing curve {curve}")]
    MissingCurve { face: String, curve: usize },

    #[error("Curve {curve} references unknown primitive {primitive}")]
    UnknownPrimitive { curve: usize, primitive: usize },

    #[error("Kernel error: {0}")]
    Cad(#[from] CadError),
}

impl TrimError {
    /// Id of the curve this error is about, if any
    pub fn curve(&self) -> Option<usize> {
        match self {
            TrimError::MalformedCurve { curve, .. }
            | TrimError::UnclassifiedCurve { curve }
            | TrimError::UnsupportedPrimitiveCombination { curve, .. }
            | TrimError::MissingCurve { curve, .. }
            | TrimError::UnknownPrimitive { curve, .. } => Some(*curve),
            TrimError::IncompleteFaceGroup { .. } | TrimError::Cad(_) => None,
        }
    }
}
