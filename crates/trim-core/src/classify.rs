//! Curve-to-primitive classification

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::config::TrimConfig;
use crate::curve::{Curve, CurveEnds, CurveNetwork, classify_open_closed, representative_point};
use crate::error::TrimError;
use crate::primitive::Primitive;

/// A curve with its derived shape and the primitives it lies on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCurve {
    pub curve: Curve,
    pub ends: CurveEnds,
    /// Matched primitive ids, in primitive input order
    pub primitives: Vec<usize>,
}

impl ClassifiedCurve {
    pub fn index(&self) -> usize {
        self.curve.index
    }

    pub fn is_closed(&self) -> bool {
        self.ends.is_closed()
    }

    pub fn representative_point(&self) -> Result<DVec3, TrimError> {
        representative_point(&self.curve, self.ends)
    }
}

/// Match a curve against every candidate primitive
pub fn classify(
    curve: &Curve,
    primitives: &[Primitive],
    config: &TrimConfig,
) -> Result<ClassifiedCurve, TrimError> {
    let ends = classify_open_closed(curve)?;

    let mut matched = Vec::new();
    for primitive in primitives {
        if primitive.contains_curve(curve, ends, config.tolerance_for(primitive))? {
            matched.push(primitive.id);
        }
    }

    if matched.is_empty() {
        return Err(TrimError::UnclassifiedCurve { curve: curve.index });
    }

    tracing::debug!(
        "Curve {} ({}) lies on primitives {:?}",
        curve.index,
        if ends.is_closed() { "closed" } else { "open" },
        matched
    );

    Ok(ClassifiedCurve {
        curve: curve.clone(),
        ends,
        primitives: matched,
    })
}

/// Classify every curve of a network, keeping failures alongside successes
pub fn classify_network(
    network: &CurveNetwork,
    primitives: &[Primitive],
    config: &TrimConfig,
) -> Vec<Result<ClassifiedCurve, TrimError>> {
    network
        .curves
        .iter()
        .map(|curve| classify(curve, primitives, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToleranceSource;

    fn segment(index: usize, a: DVec3, b: DVec3) -> Curve {
        Curve::new(index, vec![a, (a + b) * 0.5, b], vec![[0, 1], [1, 2]])
    }

    fn planes() -> Vec<Primitive> {
        vec![
            Primitive::plane(0, DVec3::Z, 1.0, 0.001),
            Primitive::plane(1, DVec3::Y, 1.0, 0.001),
            Primitive::plane(2, DVec3::X, 1.0, 0.001),
        ]
    }

    #[test]
    fn test_edge_on_two_planes() {
        let curve = segment(0, DVec3::new(-1.0, 1.0, 1.0), DVec3::new(1.0, 1.0, 1.0));
        let classified = classify(&curve, &planes(), &TrimConfig::default()).unwrap();
        assert_eq!(classified.primitives, vec![0, 1]);
        assert!(!classified.is_closed());
    }

    #[test]
    fn test_unclassified_curve() {
        let curve = segment(5, DVec3::ZERO, DVec3::new(0.5, 0.0, 0.0));
        assert!(matches!(
            classify(&curve, &planes(), &TrimConfig::default()),
            Err(TrimError::UnclassifiedCurve { curve: 5 })
        ));
    }

    #[test]
    fn test_uniform_tolerance_overrides_primitive() {
        // Off the z = 1 plane by 0.01: inside the primitive's tolerance only
        let primitives = vec![Primitive::plane(0, DVec3::Z, 1.0, 0.05)];
        let curve = segment(0, DVec3::new(0.0, 0.0, 1.01), DVec3::new(1.0, 0.0, 1.01));
        let mut config = TrimConfig::default();
        assert!(classify(&curve, &primitives, &config).is_ok());
        config.tolerance_source = ToleranceSource::Uniform;
        assert!(classify(&curve, &primitives, &config).is_err());
    }

    #[test]
    fn test_network_keeps_going_after_failures() {
        let network = CurveNetwork::new(vec![
            segment(0, DVec3::ZERO, DVec3::X),
            segment(1, DVec3::new(-1.0, 1.0, 1.0), DVec3::new(1.0, 1.0, 1.0)),
        ]);
        let results = classify_network(&network, &planes(), &TrimConfig::default());
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }
}
