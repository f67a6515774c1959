//! Cluster labels, centroids and the colours derived from them.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TractError};

const CENTROID_TOLERANCE: f32 = 1e-5;

/// Grey used when a centroid has no usable direction.
pub const NEUTRAL_GREY: Rgb = Rgb([127, 127, 127]);

/// Identifier assigned to a cluster.
///
/// # Examples
/// ```
/// use tractolabel_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u32);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Converts a raw label read for `fiber`.
    ///
    /// # Errors
    /// Returns [`TractError::NegativeClusterLabel`] for labels below zero or
    /// beyond the `u32` range.
    pub fn try_from_raw(fiber: usize, label: i64) -> Result<Self> {
        u32::try_from(label)
            .map(Self)
            .map_err(|_| TractError::NegativeClusterLabel { fiber, label })
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cluster membership of every fiber, aligned by fiber index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterLabels(Vec<ClusterId>);

impl ClusterLabels {
    /// Wraps explicit per-fiber labels.
    #[must_use]
    pub fn new(labels: Vec<ClusterId>) -> Self {
        Self(labels)
    }

    /// Parses raw per-fiber labels.
    ///
    /// # Errors
    /// Returns [`TractError::NegativeClusterLabel`] for the first label that
    /// cannot be represented as a [`ClusterId`].
    ///
    /// # Examples
    /// ```
    /// use tractolabel_core::{ClusterLabels, TractError};
    ///
    /// let labels = ClusterLabels::try_from_raw([2, 0, 2])?;
    /// assert_eq!(labels.distinct().len(), 2);
    /// assert!(ClusterLabels::try_from_raw([0, -1]).is_err());
    /// # Ok::<(), TractError>(())
    /// ```
    pub fn try_from_raw(raw: impl IntoIterator<Item = i64>) -> Result<Self> {
        raw.into_iter()
            .enumerate()
            .map(|(fiber, label)| ClusterId::try_from_raw(fiber, label))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Returns the labels in fiber order.
    #[must_use]
    pub fn as_slice(&self) -> &[ClusterId] {
        &self.0
    }

    /// Returns the number of labelled fibers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no fibers are labelled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the distinct cluster ids in ascending order.
    #[must_use]
    pub fn distinct(&self) -> Vec<ClusterId> {
        let mut ids = self.0.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Representative vector per cluster id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CentroidTable {
    dimension: usize,
    centroids: BTreeMap<ClusterId, Vec<f32>>,
}

impl CentroidTable {
    /// Collapses per-fiber centroid rows into one centroid per cluster.
    ///
    /// `rows` holds `dimension` values per fiber in the same order as
    /// `labels`. The first row seen for a cluster wins; later fibers of the
    /// same cluster must repeat it.
    ///
    /// # Errors
    /// Returns [`TractError::ZeroCentroidDimension`] when `dimension` is zero,
    /// [`TractError::CentroidCountMismatch`] when the row count differs from
    /// the label count and [`TractError::InconsistentCentroid`] when two
    /// fibers of one cluster disagree.
    ///
    /// # Examples
    /// ```
    /// use tractolabel_core::{CentroidTable, ClusterId, ClusterLabels};
    ///
    /// let labels = ClusterLabels::new(vec![ClusterId::new(1), ClusterId::new(0), ClusterId::new(1)]);
    /// let rows = [0.5, 0.5, 1.0, 0.0, 0.5, 0.5];
    /// let table = CentroidTable::from_fiber_rows(&labels, &rows, 2)?;
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.get(ClusterId::new(0)), Some(&[1.0, 0.0][..]));
    /// # Ok::<(), tractolabel_core::TractError>(())
    /// ```
    pub fn from_fiber_rows(labels: &ClusterLabels, rows: &[f32], dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(TractError::ZeroCentroidDimension);
        }
        let row_count = rows.len() / dimension;
        if rows.len() % dimension != 0 || row_count != labels.len() {
            return Err(TractError::CentroidCountMismatch {
                labels: labels.len(),
                rows: row_count,
            });
        }

        let mut centroids: BTreeMap<ClusterId, Vec<f32>> = BTreeMap::new();
        for (fiber, (&cluster, row)) in labels
            .as_slice()
            .iter()
            .zip(rows.chunks_exact(dimension))
            .enumerate()
        {
            match centroids.get(&cluster) {
                Some(known) if !rows_match(known, row) => {
                    return Err(TractError::InconsistentCentroid { cluster, fiber });
                }
                Some(_) => {}
                None => {
                    centroids.insert(cluster, row.to_vec());
                }
            }
        }
        Ok(Self {
            dimension,
            centroids,
        })
    }

    /// Returns the centroid dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the centroid recorded for `cluster`.
    #[must_use]
    pub fn get(&self, cluster: ClusterId) -> Option<&[f32]> {
        self.centroids.get(&cluster).map(Vec::as_slice)
    }

    /// Returns the number of clusters with a centroid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Iterates over centroids in ascending cluster order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &[f32])> {
        self.centroids
            .iter()
            .map(|(&cluster, centroid)| (cluster, centroid.as_slice()))
    }
}

fn rows_match(left: &[f32], right: &[f32]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| (a - b).abs() <= CENTROID_TOLERANCE || (a.is_nan() && b.is_nan()))
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Returns the red, green and blue channels.
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        self.0
    }
}

/// Derives a display colour from the first three centroid components.
///
/// The components are normalised to unit length and mapped from `[-1, 1]`
/// onto `[0, 255]`, truncating toward zero. Centroids shorter than three
/// components are zero-padded. Degenerate centroids map to [`NEUTRAL_GREY`].
///
/// # Examples
/// ```
/// use tractolabel_core::{Rgb, cluster_to_rgb};
///
/// assert_eq!(cluster_to_rgb(&[1.0, 0.0, 0.0, 9.0]), Rgb([255, 127, 127]));
/// assert_eq!(cluster_to_rgb(&[0.0, -2.0, 0.0]), Rgb([127, 0, 127]));
/// assert_eq!(cluster_to_rgb(&[0.0, 0.0, 0.0]), Rgb([127, 127, 127]));
/// ```
#[must_use]
pub fn cluster_to_rgb(centroid: &[f32]) -> Rgb {
    let mut direction = [0.0_f64; 3];
    for (slot, &value) in direction.iter_mut().zip(centroid) {
        *slot = f64::from(value);
    }
    let magnitude = direction.iter().map(|c| c * c).sum::<f64>().sqrt();
    if !magnitude.is_finite() || magnitude == 0.0 {
        return NEUTRAL_GREY;
    }
    Rgb(direction.map(|component| {
        let scaled = 127.5 + (component / magnitude) * 127.5;
        // Truncation toward zero, then clamped into the byte range.
        scaled.trunc().clamp(0.0, 255.0) as u8
    }))
}

/// Display colour per cluster id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColourTable(BTreeMap<ClusterId, Rgb>);

impl ColourTable {
    /// Derives one colour per centroid with [`cluster_to_rgb`].
    #[must_use]
    pub fn from_centroids(centroids: &CentroidTable) -> Self {
        Self(
            centroids
                .iter()
                .map(|(cluster, centroid)| (cluster, cluster_to_rgb(centroid)))
                .collect(),
        )
    }

    /// Returns the colour assigned to `cluster`.
    #[must_use]
    pub fn get(&self, cluster: ClusterId) -> Option<Rgb> {
        self.0.get(&cluster).copied()
    }

    /// Returns the number of coloured clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no cluster has a colour.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
