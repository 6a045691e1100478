pub mod matrix_io;
pub mod nifti_io;

pub use matrix_io::{parse_matrix, read_matrix, write_matrix};
pub use nifti_io::{header_affine, header_zooms, read_nifti, sform_affine, write_nifti};
