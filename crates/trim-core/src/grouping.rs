//! Coplanar patch grouping and pairing
//!
//! The four edge curves of a face each contribute one quad in the face's
//! plane. Every quad covers half the face plus the same amount outside it.
//! Intersecting opposite edges' quads with each side edge's quad recovers
//! the quarter squares, and their unions give the two halves of the face.

use glam::DVec3;
use trim_cad::{GeometryKernel, Shape};

use crate::constants::PATCHES_PER_BUCKET;
use crate::error::TrimError;
use crate::trim::{PlanarPatch, TrimmedPatch};

/// Bucket key: plane normal quantized at the arithmetic tolerance
///
/// Antiparallel normals give different keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalKey([i64; 3]);

impl NormalKey {
    pub fn new(normal: DVec3, tolerance: f64) -> Self {
        let scale = 1.0 / tolerance;
        let quantize = |c: f64| {
            let q = (c * scale).round() as i64;
            // Avoid a separate bucket for -0
            if q == 0 { 0 } else { q }
        };
        Self([quantize(normal.x), quantize(normal.y), quantize(normal.z)])
    }
}

/// Group the planar patches of plane pairs by supporting plane normal
///
/// Buckets keep the order in which their normal was first seen, and entries
/// keep input order.
pub fn bucket_by_normal<'a>(
    results: impl IntoIterator<Item = &'a TrimmedPatch>,
    tolerance: f64,
) -> Vec<(NormalKey, Vec<PlanarPatch>)> {
    let mut buckets: Vec<(NormalKey, Vec<PlanarPatch>)> = Vec::new();
    for patch in results.into_iter().flat_map(|r| r.planar_patches()) {
        let key = NormalKey::new(patch.normal, tolerance);
        match buckets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, entries)) => entries.push(*patch),
            None => buckets.push((key, vec![*patch])),
        }
    }
    buckets
}

/// Index of the entry whose center is farthest from entry 0's center
///
/// Returns `None` when every center coincides with entry 0's.
pub fn farthest_from_first(entries: &[PlanarPatch]) -> Option<usize> {
    let origin = entries.first()?.center;
    let mut best = None;
    let mut max_distance = f64::MIN_POSITIVE;
    for (index, entry) in entries.iter().enumerate() {
        let distance = (entry.center - origin).length();
        if distance > max_distance {
            max_distance = distance;
            best = Some(index);
        }
    }
    best
}

/// Merge one bucket of four coplanar patches into two face halves
pub fn merge_bucket(
    kernel: &dyn GeometryKernel,
    entries: &[PlanarPatch],
) -> Result<Option<[Shape; 2]>, TrimError> {
    if entries.len() != PATCHES_PER_BUCKET {
        return Ok(None);
    }
    let Some(far) = farthest_from_first(entries) else {
        tracing::warn!(
            "Skipping degenerate bucket of plane {}: all patch centers coincide",
            entries[0].primitive
        );
        return Ok(None);
    };

    let first = &entries[0];
    let opposite = &entries[far];
    let mut merged = Vec::with_capacity(2);
    for (_, other) in entries
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != 0 && *index != far)
    {
        let near_part = kernel.intersection(&first.face, &other.face)?;
        let far_part = kernel.intersection(&opposite.face, &other.face)?;
        merged.push(kernel.union(&near_part, &far_part)?);
    }

    match merged.as_slice() {
        [a, b] => Ok(Some([*a, *b])),
        _ => Ok(None),
    }
}

/// Merge every complete bucket of coplanar patches
///
/// Buckets without exactly four entries are skipped.
pub fn merge_coplanar_patches(
    kernel: &dyn GeometryKernel,
    results: &[TrimmedPatch],
    tolerance: f64,
) -> Result<Vec<Shape>, TrimError> {
    let mut merged = Vec::new();
    for (key, entries) in bucket_by_normal(results, tolerance) {
        if entries.len() != PATCHES_PER_BUCKET {
            tracing::debug!(
                "Skipping bucket {:?} with {} patches",
                key,
                entries.len()
            );
            continue;
        }
        if let Some(halves) = merge_bucket(kernel, &entries)? {
            merged.extend(halves);
        }
    }
    Ok(merged)
}
