//! Fiber bundles with a fixed number of samples per fiber.
//!
//! Tractography files store fibers as polylines of arbitrary length. Every
//! bundle built here resamples those polylines onto a shared sample count so
//! fibers from different files can be compared index by index.

use crate::error::{Result, TractError};

/// A 3D point in scanner coordinates.
pub type Point = [f32; 3];

/// Minimum sample count that keeps both fiber endpoints.
pub const MIN_POINTS_PER_FIBER: usize = 2;

/// Computes the source indices sampled when a polyline of `len` points is
/// resampled to `samples` points.
///
/// Samples are spaced by a fixed fractional step of `(len - 1) / (samples - 1)`
/// and each sample snaps to the nearest source index, rounding halves away
/// from zero. The first and last samples always hit the polyline endpoints.
///
/// # Examples
/// ```
/// use tractolabel_core::resample_indices;
///
/// assert_eq!(resample_indices(5, 3), vec![0, 2, 4]);
/// assert_eq!(resample_indices(4, 3), vec![0, 2, 3]);
/// assert_eq!(resample_indices(1, 2), vec![0, 0]);
/// ```
#[must_use]
pub fn resample_indices(len: usize, samples: usize) -> Vec<usize> {
    if len == 0 || samples == 0 {
        return Vec::new();
    }
    if samples == 1 {
        return vec![0];
    }
    let last = len - 1;
    let step = last as f64 / (samples - 1) as f64;
    (0..samples)
        .map(|sample| {
            let position = (sample as f64 * step).round();
            // `position` is non-negative and bounded by `last`.
            (position as usize).min(last)
        })
        .collect()
}

/// Per-point values carried alongside fiber geometry.
///
/// Channels are resampled at the same indices as the points they annotate,
/// so a scalar such as FA stays attached to the sample it was measured at.
#[derive(Debug, Clone, PartialEq)]
pub struct PointChannel {
    name: String,
    components: usize,
    values: Vec<f64>,
}

impl PointChannel {
    /// Returns the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of components per tuple.
    #[must_use]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Returns the resampled values in fiber-major, sample-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Fibers resampled to a shared number of points.
///
/// # Examples
/// ```
/// use tractolabel_core::FiberBundle;
///
/// let lines = vec![
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
///     vec![[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]],
/// ];
/// let bundle = FiberBundle::from_lines(&lines, 2)?;
/// assert_eq!(bundle.len(), 2);
/// assert_eq!(bundle.fiber(0), Some(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]][..]));
/// # Ok::<(), tractolabel_core::TractError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FiberBundle {
    points_per_fiber: usize,
    points: Vec<Point>,
    source_lengths: Vec<usize>,
    channels: Vec<PointChannel>,
}

impl FiberBundle {
    /// Resamples every line to `samples` points.
    ///
    /// # Errors
    /// Returns [`TractError::InvalidPointsPerFiber`] when `samples` is below
    /// [`MIN_POINTS_PER_FIBER`] and [`TractError::EmptyFiber`] when a line has
    /// no points.
    pub fn from_lines<L>(lines: &[L], samples: usize) -> Result<Self>
    where
        L: AsRef<[Point]>,
    {
        if samples < MIN_POINTS_PER_FIBER {
            return Err(TractError::InvalidPointsPerFiber { got: samples });
        }
        let mut points = Vec::with_capacity(lines.len().saturating_mul(samples));
        let mut source_lengths = Vec::with_capacity(lines.len());
        for (fiber, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.is_empty() {
                return Err(TractError::EmptyFiber { fiber });
            }
            points.extend(
                resample_indices(line.len(), samples)
                    .into_iter()
                    .filter_map(|index| line.get(index).copied()),
            );
            source_lengths.push(line.len());
        }
        Ok(Self {
            points_per_fiber: samples,
            points,
            source_lengths,
            channels: Vec::new(),
        })
    }

    /// Builds a bundle from lines that already share one point count.
    ///
    /// Returns `None` when `lines` is empty, when the lines disagree on their
    /// point count, or when the shared count is below
    /// [`MIN_POINTS_PER_FIBER`].
    ///
    /// # Examples
    /// ```
    /// use tractolabel_core::FiberBundle;
    ///
    /// let uniform = vec![vec![[0.0; 3]; 4], vec![[1.0; 3]; 4]];
    /// let bundle = FiberBundle::from_uniform_lines(&uniform).expect("uniform lines");
    /// assert_eq!(bundle.points_per_fiber(), 4);
    ///
    /// let ragged = vec![vec![[0.0; 3]; 4], vec![[1.0; 3]; 3]];
    /// assert!(FiberBundle::from_uniform_lines(&ragged).is_none());
    /// ```
    #[must_use]
    pub fn from_uniform_lines<L>(lines: &[L]) -> Option<Self>
    where
        L: AsRef<[Point]>,
    {
        let first = lines.first()?.as_ref().len();
        if first < MIN_POINTS_PER_FIBER || lines.iter().any(|line| line.as_ref().len() != first) {
            return None;
        }
        Self::from_lines(lines, first).ok()
    }

    /// Attaches a per-point channel, resampled at the bundle's sample indices.
    ///
    /// `lines` must hold one slice per fiber containing `components` values
    /// for every source point of that fiber.
    ///
    /// # Errors
    /// Returns [`TractError::ChannelLengthMismatch`] when the channel does not
    /// line up with the source fibers.
    pub fn with_channel<L>(
        mut self,
        name: impl Into<String>,
        components: usize,
        lines: &[L],
    ) -> Result<Self>
    where
        L: AsRef<[f64]>,
    {
        let name = name.into();
        if lines.len() != self.source_lengths.len() {
            return Err(TractError::ChannelLengthMismatch {
                channel: name,
                fiber: lines.len().min(self.source_lengths.len()),
                expected: self.source_lengths.len(),
                actual: lines.len(),
            });
        }
        let components = components.max(1);
        let mut values = Vec::with_capacity(self.points.len().saturating_mul(components));
        for (fiber, (line, &source_len)) in lines.iter().zip(&self.source_lengths).enumerate() {
            let line = line.as_ref();
            let expected = source_len.saturating_mul(components);
            if line.len() != expected {
                return Err(TractError::ChannelLengthMismatch {
                    channel: name,
                    fiber,
                    expected,
                    actual: line.len(),
                });
            }
            for index in resample_indices(source_len, self.points_per_fiber) {
                let start = index * components;
                values.extend_from_slice(&line[start..start + components]);
            }
        }
        self.channels.push(PointChannel {
            name,
            components,
            values,
        });
        Ok(self)
    }

    /// Returns the number of fibers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.source_lengths.len()
    }

    /// Returns whether the bundle holds no fibers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_lengths.is_empty()
    }

    /// Returns the shared sample count.
    #[must_use]
    pub fn points_per_fiber(&self) -> usize {
        self.points_per_fiber
    }

    /// Returns the resampled points of fiber `index`.
    #[must_use]
    pub fn fiber(&self, index: usize) -> Option<&[Point]> {
        let start = index.checked_mul(self.points_per_fiber)?;
        self.points.get(start..start + self.points_per_fiber)
    }

    /// Iterates over the resampled fibers in order.
    pub fn fibers(&self) -> impl Iterator<Item = &[Point]> {
        self.points.chunks_exact(self.points_per_fiber)
    }

    /// Returns every resampled point, fiber after fiber.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the per-point channels attached to the bundle.
    #[must_use]
    pub fn channels(&self) -> &[PointChannel] {
        &self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    fn line(len: usize) -> Vec<Point> {
        (0..len).map(|i| [i as f32, 0.0, 0.0]).collect()
    }

    #[rstest]
    #[case(5, 2, vec![0, 4])]
    #[case(5, 5, vec![0, 1, 2, 3, 4])]
    #[case(3, 5, vec![0, 1, 1, 2, 2])]
    #[case(10, 4, vec![0, 3, 6, 9])]
    #[case(0, 4, vec![])]
    fn resample_indices_snaps_to_nearest(
        #[case] len: usize,
        #[case] samples: usize,
        #[case] expected: Vec<usize>,
    ) {
        assert_eq!(resample_indices(len, samples), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn from_lines_rejects_too_few_samples(#[case] samples: usize) {
        let err = FiberBundle::from_lines(&[line(3)], samples).expect_err("samples too small");
        assert_eq!(err, TractError::InvalidPointsPerFiber { got: samples });
    }

    #[rstest]
    fn from_lines_rejects_empty_fiber() {
        let err = FiberBundle::from_lines(&[line(3), line(0)], 3).expect_err("empty fiber");
        assert_eq!(err, TractError::EmptyFiber { fiber: 1 });
    }

    #[rstest]
    fn channel_follows_point_indices() {
        let bundle = FiberBundle::from_lines(&[line(5)], 3)
            .and_then(|bundle| {
                bundle.with_channel("fa", 2, &[vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5]])
            })
            .expect("channel aligns");
        let channel = &bundle.channels()[0];
        assert_eq!(channel.name(), "fa");
        assert_eq!(channel.components(), 2);
        assert_eq!(channel.values(), &[0.0, 0.5, 2.0, 2.5, 4.0, 4.5]);
        assert_eq!(bundle.fiber(0), Some(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [4.0, 0.0, 0.0]][..]));
    }

    #[rstest]
    fn channel_rejects_misaligned_values() {
        let bundle = FiberBundle::from_lines(&[line(4)], 2).expect("bundle");
        let err = bundle
            .with_channel("fa", 1, &[vec![1.0, 2.0]])
            .expect_err("too few values");
        assert!(matches!(
            err,
            TractError::ChannelLengthMismatch { fiber: 0, expected: 4, actual: 2, .. }
        ));
    }

    #[rstest]
    fn fiber_out_of_range_is_none() {
        let bundle = FiberBundle::from_lines(&[line(4)], 2).expect("bundle");
        assert!(bundle.fiber(1).is_none());
        assert_eq!(bundle.fibers().count(), 1);
    }

    proptest! {
        #[test]
        fn resampling_keeps_endpoints(len in 1_usize..200, samples in 2_usize..64) {
            let indices = resample_indices(len, samples);
            prop_assert_eq!(indices.len(), samples);
            prop_assert_eq!(indices.first().copied(), Some(0));
            prop_assert_eq!(indices.last().copied(), Some(len - 1));
            prop_assert!(indices.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }
}
