use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::{ArrayView2, ArrayView3};
use once_cell::sync::Lazy;
use vtkio::{
    Vtk,
    model::{
        Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet,
        ElementType as VtkElementType, IOBuffer, UnstructuredGridPiece, Version, VertexNumbers,
    },
};

use crate::disc::{basis::ElementType, mesh::Mesh};
use crate::error::{Result, StabError};

/// Timestamped run directory under `outputs/`, named `MMDD_HHMM_SS`.
static OUTPUT_DIR: Lazy<String> = Lazy::new(|| {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let secs_in_day = 24 * 60 * 60;
    // rough calendar, only needs to be unique per run
    let day_of_year = (timestamp / secs_in_day) % 365;
    let (month, day) = (day_of_year / 30 + 1, day_of_year % 30 + 1);
    let seconds_today = timestamp % secs_in_day;
    format!(
        "outputs/{:02}{:02}_{:02}{:02}_{:02}",
        month,
        day,
        seconds_today / 3600,
        (seconds_today % 3600) / 60,
        seconds_today % 60
    )
});

/// Run output directory, created on first use.
pub fn output_dir() -> Result<&'static str> {
    fs::create_dir_all(OUTPUT_DIR.as_str())?;
    Ok(OUTPUT_DIR.as_str())
}

fn cell_type(element_type: ElementType) -> CellType {
    match element_type {
        ElementType::Triangle => CellType::Triangle,
        ElementType::Quadrilateral => CellType::Quad,
        ElementType::Tetrahedron => CellType::Tetra,
        ElementType::Hexahedron => CellType::Hexahedron,
    }
}

/// Element vertices as separate points, `nverts` per element.
fn vertex_piece(mesh: &Mesh, point_data: Vec<Attribute>) -> UnstructuredGridPiece {
    let nverts = mesh.nverts();
    let mut points = Vec::with_capacity(mesh.nelements * nverts * 3);
    for e in 0..mesh.nelements {
        for &vnode in &mesh.reference.vertex_nodes {
            for d in 0..3 {
                points.push(mesh.nodes[[e, vnode, d]]);
            }
        }
    }
    let connectivity = (0..(mesh.nelements * nverts) as u64).collect();
    let offsets = (1..mesh.nelements as u64 + 1)
        .map(|e| e * nverts as u64)
        .collect();
    UnstructuredGridPiece {
        points: IOBuffer::F64(points),
        cells: Cells {
            cell_verts: VertexNumbers::XML {
                connectivity,
                offsets,
            },
            types: vec![cell_type(mesh.element_type); mesh.nelements],
        },
        data: Attributes {
            point: point_data,
            cell: vec![],
        },
    }
}

fn export(piece: UnstructuredGridPiece, title: &str, file_name: &str) -> Result<()> {
    let vtk_file = Vtk {
        version: Version::XML { major: 1, minor: 0 },
        title: title.into(),
        byte_order: ByteOrder::native(),
        data: DataSet::inline(piece),
        file_path: None,
    };
    vtk_file.export(file_name).map_err(|e| StabError::Output {
        path: file_name.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Detection flags of every element, replicated on its vertices.
pub fn plot_elements(mesh: &Mesh, e_list: ArrayView2<i32>, file_name: &str) -> Result<()> {
    let nfields = e_list.ncols();
    let mut flags = Vec::with_capacity(mesh.nelements * mesh.nverts() * nfields);
    for e in 0..mesh.nelements {
        for _ in 0..mesh.nverts() {
            flags.extend(e_list.row(e).iter().map(|&flag| flag as f32));
        }
    }
    let elements = Attribute::DataArray(DataArray {
        name: "Elements".to_string(),
        elem: VtkElementType::Scalars {
            num_comp: nfields as u32,
            lookup_table: None,
        },
        data: IOBuffer::F32(flags),
    });
    export(vertex_piece(mesh, vec![elements]), "Detected elements", file_name)
}

/// Nodal fields, shape `(ntotal, nfields, np)`, sampled at element vertices.
pub fn plot_fields(mesh: &Mesh, fields: ArrayView3<f64>, name: &str, file_name: &str) -> Result<()> {
    let nfields = fields.shape()[1];
    let mut values = Vec::with_capacity(mesh.nelements * mesh.nverts() * nfields);
    for e in 0..mesh.nelements {
        for &vnode in &mesh.reference.vertex_nodes {
            for fld in 0..nfields {
                values.push(fields[[e, fld, vnode]]);
            }
        }
    }
    let data = Attribute::DataArray(DataArray {
        name: name.to_string(),
        elem: VtkElementType::Scalars {
            num_comp: nfields as u32,
            lookup_table: None,
        },
        data: IOBuffer::F64(values),
    });
    export(vertex_piece(mesh, vec![data]), name, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_plot_elements_and_fields() {
        let mesh =
            Mesh::rectangle(ElementType::Quadrilateral, 2, (2, 1), (0.0, 2.0), (0.0, 1.0)).unwrap();
        let dir = std::env::temp_dir().join("shock_stab_vtu_test");
        fs::create_dir_all(&dir).unwrap();

        let mut e_list = Array2::<i32>::zeros((mesh.ntotal(), 2));
        e_list[[1, 0]] = 1;
        let elements = dir.join("detector_0000_0000.vtu");
        plot_elements(&mesh, e_list.view(), elements.to_str().unwrap()).unwrap();
        let content = fs::read_to_string(&elements).unwrap();
        assert!(content.contains("UnstructuredGrid"));
        assert!(content.contains("Elements"));

        let visc = Array3::<f64>::from_elem((mesh.ntotal(), 1, mesh.np()), 0.25);
        let fields = dir.join("visc_0000_0000.vtu");
        plot_fields(&mesh, visc.view(), "Viscosity", fields.to_str().unwrap()).unwrap();
        assert!(fs::read_to_string(&fields).unwrap().contains("Viscosity"));
    }
}
