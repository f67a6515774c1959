//! Legacy VTK polydata I/O for tractography line datasets.

mod errors;
mod ingest;
mod polydata;
mod tractography;
mod writer;

pub use errors::VtkError;
pub use ingest::{parse_polydata, read_polydata, read_polydata_path};
pub use polydata::{DataArray, PolyData, ScalarKind};
pub use tractography::{
    CENTROID_ARRAY, CLUSTER_LABEL_ARRAY, COLOUR_ARRAY, LEGACY_CLUSTER_LABEL_ARRAY, PriorFields,
};
pub use writer::{write_polydata, write_polydata_path};

#[cfg(test)]
mod tests;
