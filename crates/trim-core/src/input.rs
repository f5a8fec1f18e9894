//! JSON input loading
//!
//! Curve network:
//! `{ "curves": [ { "pv_points": [[x,y,z], ...], "pv_lines": [[i,j], ...] } ] }`
//!
//! Primitive list:
//! `[ { "id": n, "type": "plane"|"cylinder", "params": [...], "err": tol } ]`
//! with plane params `[normal, distance]` and cylinder params
//! `[direction, base, radius]`. `err` may be omitted, in which case the
//! configured arithmetic tolerance applies.

use std::path::Path;

use glam::DVec3;
use serde::Deserialize;
use serde_json::Value;

use crate::curve::{Curve, CurveNetwork};
use crate::primitive::{Cylinder, Plane, Primitive, Surface};

/// Input loading errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Format error: {0}")]
    Format(String),
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    curves: Vec<RawCurve>,
}

#[derive(Debug, Deserialize)]
struct RawCurve {
    #[serde(alias = "points")]
    pv_points: Vec<Value>,
    #[serde(alias = "lines")]
    pv_lines: Vec<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct RawPrimitive {
    id: usize,
    #[serde(rename = "type")]
    kind: String,
    params: Vec<Value>,
    #[serde(default, alias = "tolerance")]
    err: Option<f64>,
}

/// Load a curve network from a JSON file
pub fn load_curve_network(path: impl AsRef<Path>) -> Result<CurveNetwork, InputError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| InputError::Io(format!("{}: {}", path.display(), e)))?;
    let network = parse_curve_network(&content)?;
    tracing::info!(
        "Loaded {} curves from {}",
        network.len(),
        path.display()
    );
    Ok(network)
}

/// Parse a curve network from JSON text
pub fn parse_curve_network(json: &str) -> Result<CurveNetwork, InputError> {
    let raw: RawNetwork =
        serde_json::from_str(json).map_err(|e| InputError::Parse(e.to_string()))?;

    let curves = raw
        .curves
        .into_iter()
        .enumerate()
        .map(|(index, curve)| convert_curve(index, curve))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CurveNetwork::new(curves))
}

fn convert_curve(index: usize, raw: RawCurve) -> Result<Curve, InputError> {
    if raw.pv_points.is_empty() {
        return Err(InputError::Format(format!("curve {} has no points", index)));
    }
    let points = raw
        .pv_points
        .iter()
        .map(|v| parse_vec3(v, &format!("curve {} point", index)))
        .collect::<Result<Vec<_>, _>>()?;

    let segments = raw
        .pv_lines
        .iter()
        .map(|line| match line.as_slice() {
            [a, b] if *a < points.len() && *b < points.len() => Ok([*a, *b]),
            [_, _] => Err(InputError::Format(format!(
                "curve {} segment {:?} is out of range ({} points)",
                index,
                line,
                points.len()
            ))),
            _ => Err(InputError::Format(format!(
                "curve {} segment {:?} must have 2 indices",
                index, line
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Curve::new(index, points, segments))
}

/// Load a primitive list from a JSON file
pub fn load_primitives(path: impl AsRef<Path>) -> Result<Vec<Primitive>, InputError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| InputError::Io(format!("{}: {}", path.display(), e)))?;
    let primitives = parse_primitives(&content)?;
    tracing::info!(
        "Loaded {} primitives from {}",
        primitives.len(),
        path.display()
    );
    Ok(primitives)
}

/// Parse a primitive list from JSON text
pub fn parse_primitives(json: &str) -> Result<Vec<Primitive>, InputError> {
    let raw: Vec<RawPrimitive> =
        serde_json::from_str(json).map_err(|e| InputError::Parse(e.to_string()))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, primitive)| convert_primitive(index, primitive))
        .collect()
}

fn convert_primitive(index: usize, raw: RawPrimitive) -> Result<Primitive, InputError> {
    if raw.id != index {
        return Err(InputError::Format(format!(
            "primitive at position {} has id {}",
            index, raw.id
        )));
    }
    if raw.err.is_some_and(|err| err.is_nan() || err < 0.0) {
        return Err(InputError::Format(format!(
            "primitive {} has invalid tolerance {:?}",
            raw.id, raw.err
        )));
    }

    let context = format!("primitive {}", raw.id);
    let surface = match (raw.kind.as_str(), raw.params.as_slice()) {
        ("plane", [normal, distance]) => Surface::Plane(Plane::new(
            parse_vec3(normal, &format!("{} normal", context))?,
            parse_scalar(distance, &format!("{} distance", context))?,
        )),
        ("cylinder", [direction, base, radius]) => Surface::Cylinder(Cylinder::new(
            parse_scalar(radius, &format!("{} radius", context))?,
            parse_vec3(base, &format!("{} base", context))?,
            parse_vec3(direction, &format!("{} direction", context))?,
        )),
        ("plane", params) | ("cylinder", params) => {
            return Err(InputError::Format(format!(
                "{} of type {} has {} params",
                context,
                raw.kind,
                params.len()
            )));
        }
        (other, _) => {
            return Err(InputError::Format(format!(
                "{} has unknown type '{}'",
                context, other
            )));
        }
    };

    Ok(Primitive {
        id: raw.id,
        surface,
        tolerance: raw.err,
    })
}

/// Parse `[x, y, z]`, also accepting a single nested level `[[x, y, z]]`
fn parse_vec3(value: &Value, context: &str) -> Result<DVec3, InputError> {
    let Some(items) = value.as_array() else {
        return Err(InputError::Format(format!("{}: expected an array", context)));
    };
    if let [inner @ Value::Array(_)] = items.as_slice() {
        return parse_vec3(inner, context);
    }
    let coords = items
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| InputError::Format(format!("{}: expected numbers", context)))?;
    match coords.as_slice() {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        other => Err(InputError::Format(format!(
            "{}: expected 3 components, got {}",
            context,
            other.len()
        ))),
    }
}

/// Parse a number, also accepting a one-element array
fn parse_scalar(value: &Value, context: &str) -> Result<f64, InputError> {
    match value {
        Value::Array(items) if items.len() == 1 => parse_scalar(&items[0], context),
        other => other
            .as_f64()
            .ok_or_else(|| InputError::Format(format!("{}: expected a number", context))),
    }
}
