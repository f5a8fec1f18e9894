//! Solid assembly
//!
//! Cube faces are reconstructed from their edge curves and fused into the
//! cube. Every other curve is trimmed on its own and the results are fused
//! into one auxiliary solid. Both end up in a single compound.

use std::collections::BTreeSet;

use trim_cad::{GeometryKernel, Shape};

use crate::config::{CubeFace, TrimConfig};
use crate::curve::CurveNetwork;
use crate::error::TrimError;
use crate::grouping::merge_coplanar_patches;
use crate::primitive::Primitive;
use crate::trim::{TrimmedPatch, Trimmer};

/// Why an auxiliary curve contributed nothing
#[derive(Debug, Clone)]
pub enum SkipReason {
    /// Classification or trimming failed
    Failed(TrimError),
    /// Plane+plane result outside any cube face
    UnpairedPlanePair,
}

/// An auxiliary curve left out of the model
#[derive(Debug, Clone)]
pub struct SkippedCurve {
    pub curve: usize,
    pub reason: SkipReason,
}

/// What happened to each curve during assembly
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    /// Curves consumed by cube faces
    pub cube_curves: Vec<usize>,
    /// Auxiliary curves fused into the auxiliary solid
    pub auxiliary_curves: Vec<usize>,
    pub skipped: Vec<SkippedCurve>,
}

/// The assembled model
#[derive(Debug, Clone)]
pub struct AssembledModel {
    /// Cube and auxiliary solid, kept as separate constituents
    pub compound: Shape,
    pub cube: Shape,
    pub auxiliary: Option<Shape>,
    pub report: AssemblyReport,
}

/// Reconstruct one cube face from its edge curves
pub fn trim_face(
    trimmer: &Trimmer<'_>,
    network: &CurveNetwork,
    face: &CubeFace,
    tolerance: f64,
) -> Result<Shape, TrimError> {
    let mut results: Vec<TrimmedPatch> = Vec::with_capacity(face.curves.len());
    for &index in &face.curves {
        let curve = network.get(index).ok_or_else(|| TrimError::MissingCurve {
            face: face.name.clone(),
            curve: index,
        })?;
        results.push(trimmer.trim_curve(curve)?);
    }

    let merged = merge_coplanar_patches(trimmer.kernel(), &results, tolerance)?;
    match merged.as_slice() {
        [a, b] => {
            tracing::debug!("Face '{}' merged from curves {:?}", face.name, face.curves);
            Ok(trimmer.kernel().union(a, b)?)
        }
        _ => Err(TrimError::IncompleteFaceGroup {
            face: face.name.clone(),
            patches: merged.len(),
        }),
    }
}

/// Reconstruct and fuse all configured cube faces
///
/// Faces are fused in pairs (0+1, 2+3, ...) and the pairs are folded into
/// the cube.
pub fn trim_cube(
    trimmer: &Trimmer<'_>,
    network: &CurveNetwork,
    config: &TrimConfig,
) -> Result<Shape, TrimError> {
    let kernel = trimmer.kernel();
    let faces = config
        .cube_faces
        .iter()
        .map(|face| trim_face(trimmer, network, face, config.arithmetic_tolerance))
        .collect::<Result<Vec<_>, _>>()?;

    let mut pairs = Vec::with_capacity(faces.len().div_ceil(2));
    for pair in faces.chunks(2) {
        match pair {
            [a, b] => pairs.push(kernel.union(a, b)?),
            [single] => pairs.push(*single),
            _ => {}
        }
    }

    let mut pairs = pairs.into_iter();
    let first = pairs.next().ok_or_else(|| TrimError::IncompleteFaceGroup {
        face: "cube".into(),
        patches: 0,
    })?;
    let cube = pairs.try_fold(first, |cube, pair| kernel.union(&cube, &pair))?;
    tracing::info!("Assembled cube from {} faces", faces.len());
    Ok(cube)
}

/// Trim every curve outside the cube faces and fuse the results
pub fn trim_auxiliary(
    trimmer: &Trimmer<'_>,
    network: &CurveNetwork,
    cube_curves: &BTreeSet<usize>,
    report: &mut AssemblyReport,
) -> Result<Option<Shape>, TrimError> {
    let mut shapes = Vec::new();
    for curve in network
        .curves
        .iter()
        .filter(|c| !cube_curves.contains(&c.index))
    {
        match trimmer.trim_curve(curve) {
            Ok(TrimmedPatch::Single(shape)) => {
                report.auxiliary_curves.push(curve.index);
                shapes.push(shape);
            }
            Ok(TrimmedPatch::PlanePair(_)) => {
                tracing::warn!(
                    "Curve {} lies on two planes outside any cube face, skipped",
                    curve.index
                );
                report.skipped.push(SkippedCurve {
                    curve: curve.index,
                    reason: SkipReason::UnpairedPlanePair,
                });
            }
            Err(e) => {
                tracing::warn!("Curve {} skipped: {}", curve.index, e);
                report.skipped.push(SkippedCurve {
                    curve: curve.index,
                    reason: SkipReason::Failed(e),
                });
            }
        }
    }

    let kernel = trimmer.kernel();
    let mut shapes = shapes.into_iter();
    let Some(first) = shapes.next() else {
        return Ok(None);
    };
    let fused = shapes.try_fold(first, |acc, shape| kernel.union(&acc, &shape))?;
    Ok(Some(fused))
}

/// Classify, trim and assemble a whole curve network
pub fn trim_object(
    network: &CurveNetwork,
    primitives: &[Primitive],
    config: &TrimConfig,
    kernel: &dyn GeometryKernel,
) -> Result<AssembledModel, TrimError> {
    let trimmer = Trimmer::new(kernel, primitives, config);
    let cube_curves: BTreeSet<usize> = config.cube_curves().into_iter().collect();

    let cube = trim_cube(&trimmer, network, config)?;

    let mut report = AssemblyReport {
        cube_curves: cube_curves.iter().copied().collect(),
        ..Default::default()
    };
    let auxiliary = trim_auxiliary(&trimmer, network, &cube_curves, &mut report)?;

    let mut constituents = vec![cube];
    constituents.extend(auxiliary);
    let compound = kernel.make_compound(&constituents)?;

    tracing::info!(
        "Assembled model: {} auxiliary curves fused, {} skipped",
        report.auxiliary_curves.len(),
        report.skipped.len()
    );

    Ok(AssembledModel {
        compound,
        cube,
        auxiliary,
        report,
    })
}
