use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::Array3;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use polyrigid_core::image::{Image, ImageMetadata};
use polyrigid_core::spatial::{determinant_sign, Affine, Spacing3};
use std::path::Path;

/// The raw sform rows as an affine, whatever `sform_code` says.
///
/// An unset sform is all zeros, so its determinant sign is `0`.
pub fn sform_affine(header: &NiftiHeader) -> Affine {
    rows_to_affine(&[header.srow_x, header.srow_y, header.srow_z])
}

/// Voxel sizes recorded in `pixdim[1..4]`.
pub fn header_zooms(header: &NiftiHeader) -> Spacing3 {
    Spacing3::new(
        header.pixdim[1] as f64,
        header.pixdim[2] as f64,
        header.pixdim[3] as f64,
    )
}

/// Voxel-to-world affine of a NIfTI header.
///
/// Uses the sform when `sform_code > 0`, else the qform when
/// `qform_code > 0`, else a diagonal affine built from `pixdim`.
pub fn header_affine(header: &NiftiHeader) -> Affine {
    let rows = if header.sform_code > 0 {
        [header.srow_x, header.srow_y, header.srow_z]
    } else if header.qform_code > 0 {
        // See NIfTI standard
        let b = header.quatern_b;
        let c = header.quatern_c;
        let d = header.quatern_d;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 { 1.0 } else { header.pixdim[0] };

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * b * c - 2.0 * a * d;
        let r13 = 2.0 * b * d + 2.0 * a * c;

        let r21 = 2.0 * b * c + 2.0 * a * d;
        let r22 = a * a + c * c - b * b - d * d;
        let r23 = 2.0 * c * d - 2.0 * a * b;

        let r31 = 2.0 * b * d - 2.0 * a * c;
        let r32 = 2.0 * c * d + 2.0 * a * b;
        let r33 = a * a + d * d - c * c - b * b;

        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3] * qfac;

        [
            [r11 * dx, r12 * dy, r13 * dz, header.quatern_x],
            [r21 * dx, r22 * dy, r23 * dz, header.quatern_y],
            [r31 * dx, r32 * dy, r33 * dz, header.quatern_z],
        ]
    } else {
        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3];
        [
            [dx, 0.0, 0.0, 0.0],
            [0.0, dy, 0.0, 0.0],
            [0.0, 0.0, dz, 0.0],
        ]
    };

    rows_to_affine(&rows)
}

fn rows_to_affine(rows: &[[f32; 4]; 3]) -> Affine {
    let mut affine = Affine::identity();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            affine[(r, c)] = *value as f64;
        }
    }
    affine
}

/// Read a 3D NIfTI volume.
///
/// Array axes 0, 1, 2 are the file's i, j, k axes; no reorientation is done.
/// The header keeps the file's pixdim as zooms and the sign of its raw sform.
pub fn read_nifti<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 3>> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header();
    let metadata = ImageMetadata::from_affine(&header_affine(header))
        .with_zooms(header_zooms(header))
        .with_sform_sign(determinant_sign(&sform_affine(header)));

    let volume = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;

    let shape = volume.shape().to_vec();
    if shape.len() != 3 {
        anyhow::bail!(
            "Expected 3D NIfTI file {}, found {} dimensions",
            path.display(),
            shape.len()
        );
    }
    let dims = [shape[0], shape[1], shape[2]];

    // Logical (row-major) order, independent of the array's memory layout.
    let values: Vec<f32> = volume.iter().copied().collect();
    let tensor = Tensor::<B, 3>::from_data(TensorData::new(values, dims), device);

    Ok(Image::from_metadata(tensor, metadata))
}

/// Write an image to a NIfTI file (gzip-compressed when the path ends in `.gz`).
///
/// The header carries the image affine as an aligned sform and its zooms as pixdim.
pub fn write_nifti<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 3>) -> Result<()> {
    let path = path.as_ref();
    let [d0, d1, d2] = image.shape();
    let values = image
        .to_vec()
        .map_err(|e| anyhow::anyhow!("Failed to get tensor data: {}", e))?;

    let array = Array3::from_shape_vec((d0, d1, d2), values)
        .map_err(|e| anyhow::anyhow!("Failed to create ndarray: {}", e))?;

    let header = header_for(image.metadata());
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;

    Ok(())
}

fn header_for(metadata: &ImageMetadata<3>) -> NiftiHeader {
    let affine = metadata.affine();
    let spacing = metadata.zooms();
    let row = |r: usize| {
        [
            affine[(r, 0)] as f32,
            affine[(r, 1)] as f32,
            affine[(r, 2)] as f32,
            affine[(r, 3)] as f32,
        ]
    };

    NiftiHeader {
        pixdim: [
            1.0,
            spacing[0] as f32,
            spacing[1] as f32,
            spacing[2] as f32,
            1.0,
            1.0,
            1.0,
            1.0,
        ],
        sform_code: 2,
        qform_code: 0,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        ..NiftiHeader::default()
    }
}
