//! Model export: STL meshes and kernel exchange files

use std::path::Path;

use trim_cad::{CadError, GeometryKernel, Shape, TessellatedMesh};

/// Export-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Tessellation error: {0}")]
    Tessellation(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("Kernel error: {0}")]
    Cad(#[from] CadError),
}

/// Write a tessellated mesh as binary STL, returning the triangle count
pub fn save_stl(mesh: &TessellatedMesh, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    let path = path.as_ref();

    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for chunk in mesh.indices.chunks(3) {
        let [i0, i1, i2] = chunk else {
            continue;
        };
        let vertex = |i: u32| {
            mesh.vertices
                .get(i as usize)
                .copied()
                .ok_or_else(|| ExportError::Write(format!("vertex index {} out of range", i)))
        };
        let v0 = vertex(*i0)?;
        let v1 = vertex(*i1)?;
        let v2 = vertex(*i2)?;

        // Facet normal from the winding
        let e1 = glam::Vec3::from(v1) - glam::Vec3::from(v0);
        let e2 = glam::Vec3::from(v2) - glam::Vec3::from(v0);
        let normal = e1.cross(e2).try_normalize().unwrap_or(glam::Vec3::Z);

        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new(normal.to_array()),
            vertices: [
                stl_io::Vertex::new(v0),
                stl_io::Vertex::new(v1),
                stl_io::Vertex::new(v2),
            ],
        });
    }

    let mut file = std::fs::File::create(path).map_err(|e| ExportError::Io(e.to_string()))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| ExportError::Write(e.to_string()))?;

    Ok(triangles.len())
}

/// Tessellate a shape and write it as STL
pub fn export_stl(
    kernel: &dyn GeometryKernel,
    shape: &Shape,
    tolerance: f64,
    path: impl AsRef<Path>,
) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let mesh = kernel
        .tessellate(shape, tolerance)
        .map_err(|e| ExportError::Tessellation(e.to_string()))?;
    if mesh.is_empty() {
        return Err(ExportError::Tessellation(
            "Shape produced an empty mesh".into(),
        ));
    }
    let count = save_stl(&mesh, path)?;
    tracing::info!("Saved {} triangles to {}", count, path.display());
    Ok(count)
}

/// Write a shape in the kernel's exchange format
pub fn export_exchange(
    kernel: &dyn GeometryKernel,
    shape: &Shape,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    kernel.export_exchange(shape, path.as_ref())?;
    Ok(())
}
