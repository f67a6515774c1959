//! Copies prior cluster membership onto transformed tractography.
//!
//! A [`PriorClustering`] bundles resampled prior fibers with their labels and
//! centroids. [`LabelTransfer`] resamples a transformed copy of the same
//! fibers onto the prior's sample count and re-attaches the prior's labels,
//! centroids and colours fiber by fiber.

use tracing::{Span, field, info, instrument};

use crate::{
    Result,
    cluster::{CentroidTable, ClusterId, ClusterLabels, ColourTable, NEUTRAL_GREY, Rgb},
    error::TractError,
    fiber::{FiberBundle, Point},
};

/// Previously clustered tractography used as the label source.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorClustering {
    bundle: FiberBundle,
    labels: ClusterLabels,
    centroids: CentroidTable,
    colours: ColourTable,
}

impl PriorClustering {
    /// Validates and assembles a prior clustering.
    ///
    /// # Errors
    /// Returns [`TractError::EmptyPrior`] for a bundle without fibers,
    /// [`TractError::LabelCountMismatch`] when labels and fibers are
    /// misaligned and [`TractError::MissingCentroid`] when a label has no
    /// centroid.
    pub fn new(bundle: FiberBundle, labels: ClusterLabels, centroids: CentroidTable) -> Result<Self> {
        if bundle.is_empty() {
            return Err(TractError::EmptyPrior);
        }
        if labels.len() != bundle.len() {
            return Err(TractError::LabelCountMismatch {
                fibers: bundle.len(),
                labels: labels.len(),
            });
        }
        if let Some(cluster) = labels
            .distinct()
            .into_iter()
            .find(|&cluster| centroids.get(cluster).is_none())
        {
            return Err(TractError::MissingCentroid { cluster });
        }
        let colours = ColourTable::from_centroids(&centroids);
        Ok(Self {
            bundle,
            labels,
            centroids,
            colours,
        })
    }

    /// Returns the resampled prior fibers.
    #[must_use]
    pub fn bundle(&self) -> &FiberBundle {
        &self.bundle
    }

    /// Returns the per-fiber labels.
    #[must_use]
    pub fn labels(&self) -> &ClusterLabels {
        &self.labels
    }

    /// Returns the per-cluster centroids.
    #[must_use]
    pub fn centroids(&self) -> &CentroidTable {
        &self.centroids
    }

    /// Returns the per-cluster colours derived from the centroids.
    #[must_use]
    pub fn colours(&self) -> &ColourTable {
        &self.colours
    }
}

/// Transformed fibers annotated with the prior's cluster metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredBundle {
    bundle: FiberBundle,
    labels: ClusterLabels,
    colours: Vec<Rgb>,
    centroid_dimension: usize,
    centroids: Vec<f32>,
    cluster_count: usize,
}

impl ClusteredBundle {
    /// Returns the resampled transformed fibers.
    #[must_use]
    pub fn bundle(&self) -> &FiberBundle {
        &self.bundle
    }

    /// Returns the labels copied from the prior, aligned by fiber index.
    #[must_use]
    pub fn labels(&self) -> &ClusterLabels {
        &self.labels
    }

    /// Returns the colour of every fiber.
    #[must_use]
    pub fn colours(&self) -> &[Rgb] {
        &self.colours
    }

    /// Returns the colour of fiber `fiber`.
    #[must_use]
    pub fn colour_of(&self, fiber: usize) -> Option<Rgb> {
        self.colours.get(fiber).copied()
    }

    /// Returns the number of centroid components per fiber.
    #[must_use]
    pub fn centroid_dimension(&self) -> usize {
        self.centroid_dimension
    }

    /// Returns every fiber's centroid row, fiber after fiber.
    #[must_use]
    pub fn centroids(&self) -> &[f32] {
        &self.centroids
    }

    /// Returns the centroid row attached to fiber `fiber`.
    #[must_use]
    pub fn centroid_of(&self, fiber: usize) -> Option<&[f32]> {
        let start = fiber.checked_mul(self.centroid_dimension)?;
        self.centroids.get(start..start + self.centroid_dimension)
    }

    /// Returns how many distinct clusters the fibers belong to.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }
}

/// Entry point for transferring prior labels onto transformed fibers.
///
/// # Examples
/// ```
/// use tractolabel_core::{ClusterLabels, TransferBuilder};
///
/// let transfer = TransferBuilder::new().with_points_per_fiber(3).build()?;
/// let prior_lines = vec![
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
///     vec![[0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [2.0, 1.0, 0.0]],
/// ];
/// let labels = ClusterLabels::try_from_raw([1, 0])?;
/// let prior = transfer.prior_from_lines(&prior_lines, labels, &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0], 3)?;
///
/// let moved = vec![
///     vec![[5.0, 0.0, 0.0], [5.5, 0.0, 0.0], [6.0, 0.0, 0.0], [7.0, 0.0, 0.0]],
///     vec![[5.0, 1.0, 0.0], [7.0, 1.0, 0.0]],
/// ];
/// let clustered = transfer.apply(&prior, &moved)?;
/// assert_eq!(clustered.bundle().points_per_fiber(), 3);
/// assert_eq!(clustered.labels().as_slice()[0].get(), 1);
/// assert_eq!(clustered.colour_of(1).map(|c| c.channels()), Some([255, 127, 127]));
/// # Ok::<(), tractolabel_core::TractError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LabelTransfer {
    points_per_fiber: usize,
}

impl LabelTransfer {
    pub(crate) fn new(points_per_fiber: usize) -> Self {
        Self { points_per_fiber }
    }

    /// Returns the sample count applied to non-uniform prior fibers.
    #[must_use]
    pub fn points_per_fiber(&self) -> usize {
        self.points_per_fiber
    }

    /// Builds a prior from raw lines, labels and per-fiber centroid rows.
    ///
    /// Lines that already share one point count keep it; otherwise they are
    /// resampled to [`Self::points_per_fiber`]. A configured count that a
    /// uniform prior overrides is reported at `info` level.
    ///
    /// # Errors
    /// Propagates resampling, centroid and alignment failures as
    /// [`TractError`].
    pub fn prior_from_lines<L>(
        &self,
        lines: &[L],
        labels: ClusterLabels,
        centroid_rows: &[f32],
        centroid_dimension: usize,
    ) -> Result<PriorClustering>
    where
        L: AsRef<[Point]>,
    {
        if lines.is_empty() {
            return Err(TractError::EmptyPrior);
        }
        let bundle = match FiberBundle::from_uniform_lines(lines) {
            Some(bundle) => {
                if bundle.points_per_fiber() != self.points_per_fiber {
                    info!(
                        native = bundle.points_per_fiber(),
                        requested = self.points_per_fiber,
                        "prior is uniformly sampled; keeping its native sample count"
                    );
                }
                bundle
            }
            None => FiberBundle::from_lines(lines, self.points_per_fiber)?,
        };
        let centroids = CentroidTable::from_fiber_rows(&labels, centroid_rows, centroid_dimension)?;
        PriorClustering::new(bundle, labels, centroids)
    }

    /// Resamples transformed lines onto the prior's sample count.
    ///
    /// # Errors
    /// Returns [`TractError::EmptyTarget`] when `lines` is empty and
    /// propagates resampling failures.
    pub fn resample_target<L>(&self, prior: &PriorClustering, lines: &[L]) -> Result<FiberBundle>
    where
        L: AsRef<[Point]>,
    {
        if lines.is_empty() {
            return Err(TractError::EmptyTarget);
        }
        FiberBundle::from_lines(lines, prior.bundle().points_per_fiber())
    }

    /// Resamples `lines` and labels them with the prior's clusters.
    ///
    /// # Errors
    /// See [`Self::resample_target`] and [`Self::label`].
    pub fn apply<L>(&self, prior: &PriorClustering, lines: &[L]) -> Result<ClusteredBundle>
    where
        L: AsRef<[Point]>,
    {
        let target = self.resample_target(prior, lines)?;
        self.label(prior, target)
    }

    /// Copies the prior's labels, centroids and colours onto `target`.
    ///
    /// # Errors
    /// Returns [`TractError::EmptyTarget`] for an empty bundle,
    /// [`TractError::SampleCountMismatch`] when `target` was not resampled to
    /// the prior's sample count and [`TractError::FiberCountMismatch`] when
    /// the fiber counts differ.
    #[instrument(
        name = "core.transfer",
        err,
        skip(self, prior, target),
        fields(fibers = field::Empty, points_per_fiber = field::Empty, clusters = field::Empty),
    )]
    pub fn label(&self, prior: &PriorClustering, target: FiberBundle) -> Result<ClusteredBundle> {
        if target.is_empty() {
            return Err(TractError::EmptyTarget);
        }
        let expected_samples = prior.bundle().points_per_fiber();
        if target.points_per_fiber() != expected_samples {
            return Err(TractError::SampleCountMismatch {
                prior: expected_samples,
                target: target.points_per_fiber(),
            });
        }
        if target.len() != prior.labels().len() {
            return Err(TractError::FiberCountMismatch {
                prior: prior.labels().len(),
                target: target.len(),
            });
        }

        let labels = prior.labels().clone();
        let dimension = prior.centroids().dimension();
        let mut colours = Vec::with_capacity(labels.len());
        let mut centroids = Vec::with_capacity(labels.len().saturating_mul(dimension));
        for &cluster in labels.as_slice() {
            colours.push(prior.colours().get(cluster).unwrap_or(NEUTRAL_GREY));
            centroids.extend_from_slice(centroid_for(prior, cluster)?);
        }
        let cluster_count = labels.distinct().len();

        let span = Span::current();
        span.record("fibers", target.len());
        span.record("points_per_fiber", expected_samples);
        span.record("clusters", cluster_count);
        info!(
            fibers = target.len(),
            clusters = cluster_count,
            "cluster labels transferred"
        );

        Ok(ClusteredBundle {
            bundle: target,
            labels,
            colours,
            centroid_dimension: dimension,
            centroids,
            cluster_count,
        })
    }
}

fn centroid_for(prior: &PriorClustering, cluster: ClusterId) -> Result<&[f32]> {
    prior
        .centroids()
        .get(cluster)
        .ok_or(TractError::MissingCentroid { cluster })
}
