use super::{PolyData, VtkError};
use crate::ingest::parse_polydata;
use tractolabel_test_support::fixtures::{PolyDataFixture, straight_fiber};

/// Prepends an ASCII polydata header to `body`.
pub(crate) fn document(version: &str, body: &str) -> String {
    format!("# vtk DataFile Version {version}\nunit test\nASCII\nDATASET POLYDATA\n{body}")
}

pub(crate) fn parse(text: &str) -> Result<PolyData, VtkError> {
    parse_polydata(text.as_bytes())
}

pub(crate) fn parse_ok(text: &str) -> PolyData {
    parse(text).expect("document must parse")
}

/// Two fibers of three and four points with labels, centroids and a point
/// array.
pub(crate) fn clustered_fixture() -> PolyDataFixture {
    PolyDataFixture::new()
        .line(&straight_fiber(0.0, 3))
        .line(&straight_fiber(1.0, 4))
        .cell_field("ClusterLabel", "int", 1, &[2.0, 5.0])
        .cell_field("Centroid", "float", 3, &[1.0, 0.0, 0.0, 0.0, 0.5, 0.0])
        .cell_field("FiberLength", "float", 1, &[2.0, 3.0])
        .point_field("FA", "float", 1, &[0.5, 0.25, 0.75, 1.0, 0.5, 0.0, 0.25])
}
