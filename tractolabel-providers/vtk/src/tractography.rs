//! Mapping between VTK polydata and the tractography domain.
use tracing::warn;
use tractolabel_core::{ClusterLabels, ClusteredBundle, FiberBundle, Point};

use crate::errors::VtkError;
use crate::polydata::{DataArray, PolyData, ScalarKind};

/// Cell array carrying each fiber's cluster label.
pub const CLUSTER_LABEL_ARRAY: &str = "ClusterLabel";
/// Older files name the label array this way.
pub const LEGACY_CLUSTER_LABEL_ARRAY: &str = "ClusterNumber";
/// Cell array carrying each fiber's RGB colour.
pub const COLOUR_ARRAY: &str = "Colour";
/// Cell array carrying each fiber's cluster centroid.
pub const CENTROID_ARRAY: &str = "Centroid";

const GENERATED_CELL_ARRAYS: [&str; 4] = [
    COLOUR_ARRAY,
    CLUSTER_LABEL_ARRAY,
    CENTROID_ARRAY,
    LEGACY_CLUSTER_LABEL_ARRAY,
];

/// Cluster metadata read from a prior clustering's cell data.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorFields {
    pub labels: ClusterLabels,
    /// Per-fiber centroid rows, fiber after fiber.
    pub centroid_rows: Vec<f32>,
    pub centroid_dimension: usize,
}

impl PolyData {
    /// Returns the points of every line cell in line order.
    #[must_use]
    pub fn line_points(&self) -> Vec<Vec<Point>> {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .filter_map(|&index| self.points.get(index).copied())
                    .collect()
            })
            .collect()
    }

    /// Gathers the tuples of point array `array` for every line, in line
    /// order.
    #[must_use]
    pub fn line_point_values(&self, array: &DataArray) -> Vec<Vec<f64>> {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .filter_map(|&index| array.tuple(index))
                    .flatten()
                    .copied()
                    .collect()
            })
            .collect()
    }

    /// Reads cluster labels and centroid rows from the line cell data.
    ///
    /// The label array is looked up as [`CLUSTER_LABEL_ARRAY`] first and
    /// [`LEGACY_CLUSTER_LABEL_ARRAY`] second.
    ///
    /// # Errors
    /// Returns [`VtkError::MissingArray`] when either array is absent,
    /// [`VtkError::ArrayLengthMismatch`] when an array does not hold one tuple
    /// per line, [`VtkError::InvalidClusterLabel`] for labels that are not
    /// whole numbers within the label range and [`VtkError::Tract`] for
    /// negative labels.
    pub fn prior_fields(&self) -> Result<PriorFields, VtkError> {
        let labels = self
            .line_cell_array(CLUSTER_LABEL_ARRAY)
            .or_else(|| self.line_cell_array(LEGACY_CLUSTER_LABEL_ARRAY))
            .ok_or_else(|| VtkError::MissingArray {
                name: CLUSTER_LABEL_ARRAY.to_owned(),
            })?;
        self.expect_one_per_line(&labels)?;
        let centroids =
            self.line_cell_array(CENTROID_ARRAY)
                .ok_or_else(|| VtkError::MissingArray {
                    name: CENTROID_ARRAY.to_owned(),
                })?;
        self.expect_one_per_line(&centroids)?;

        let raw_labels = labels
            .values
            .chunks_exact(labels.components)
            .enumerate()
            .map(|(line, tuple)| label_value(line, tuple[0]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PriorFields {
            labels: ClusterLabels::try_from_raw(raw_labels)?,
            centroid_rows: centroids.values.iter().map(|&value| value as f32).collect(),
            centroid_dimension: centroids.components,
        })
    }

    /// Resamples every point array onto `bundle`, which must have been built
    /// from [`Self::line_points`].
    ///
    /// # Errors
    /// Returns [`VtkError::Tract`] when an array does not hold one tuple per
    /// point.
    pub fn attach_point_channels(&self, bundle: FiberBundle) -> Result<FiberBundle, VtkError> {
        self.point_data.iter().try_fold(bundle, |bundle, array| {
            let values = self.line_point_values(array);
            Ok(bundle.with_channel(array.name.clone(), array.components, &values)?)
        })
    }

    /// Returns the line cell arrays that the label transfer does not
    /// regenerate.
    ///
    /// Arrays that do not hold exactly one tuple per line are dropped with a
    /// warning.
    #[must_use]
    pub fn preserved_cell_arrays(&self) -> Vec<DataArray> {
        self.cell_data
            .iter()
            .filter(|array| !GENERATED_CELL_ARRAYS.contains(&array.name.as_str()))
            .filter_map(|array| {
                let sliced = self.line_cell_array(&array.name)?;
                if sliced.tuples() == self.lines.len() {
                    Some(sliced)
                } else {
                    warn!(
                        array = %array.name,
                        tuples = sliced.tuples(),
                        lines = self.lines.len(),
                        "dropping cell array that does not cover every line"
                    );
                    None
                }
            })
            .collect()
    }

    /// Builds polydata for a labelled bundle.
    ///
    /// Each fiber becomes one line cell over a contiguous run of points. Cell
    /// data holds [`COLOUR_ARRAY`], [`CLUSTER_LABEL_ARRAY`] and
    /// [`CENTROID_ARRAY`] followed by `preserved`; point data holds the
    /// bundle's resampled channels.
    #[must_use]
    pub fn from_clustered(clustered: &ClusteredBundle, preserved: Vec<DataArray>) -> Self {
        let bundle = clustered.bundle();
        let per_fiber = bundle.points_per_fiber();
        let lines = (0..bundle.len())
            .map(|fiber| (fiber * per_fiber..(fiber + 1) * per_fiber).collect())
            .collect();

        let colours = clustered
            .colours()
            .iter()
            .flat_map(|rgb| rgb.channels())
            .map(f64::from)
            .collect();
        let labels = clustered
            .labels()
            .as_slice()
            .iter()
            .map(|id| f64::from(id.get()))
            .collect();
        let centroids = clustered.centroids().iter().copied().map(f64::from).collect();

        let mut cell_data = vec![
            DataArray::new(COLOUR_ARRAY, ScalarKind::UnsignedChar, 3, colours),
            DataArray::new(CLUSTER_LABEL_ARRAY, ScalarKind::Int, 1, labels),
            DataArray::new(
                CENTROID_ARRAY,
                ScalarKind::Float,
                clustered.centroid_dimension(),
                centroids,
            ),
        ];
        cell_data.extend(preserved);

        let point_data = bundle
            .channels()
            .iter()
            .map(|channel| {
                DataArray::new(
                    channel.name(),
                    ScalarKind::Double,
                    channel.components(),
                    channel.values().to_vec(),
                )
            })
            .collect();

        Self {
            title: "tractolabel clustered tractography".to_owned(),
            points: bundle.points().to_vec(),
            lines,
            vertex_cells: 0,
            point_data,
            cell_data,
        }
    }

    fn expect_one_per_line(&self, array: &DataArray) -> Result<(), VtkError> {
        if array.tuples() == self.lines.len() && array.values.len() % array.components == 0 {
            Ok(())
        } else {
            Err(VtkError::ArrayLengthMismatch {
                name: array.name.clone(),
                expected: self.lines.len(),
                actual: array.tuples(),
            })
        }
    }
}

/// Converts a stored label to an integer without rounding or saturating.
fn label_value(line: usize, value: f64) -> Result<i64, VtkError> {
    if value.is_finite() && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as i64)
    } else {
        Err(VtkError::InvalidClusterLabel { line, value })
    }
}
