//! Builder utilities for configuring label transfer.
//!
//! Validates the sampling configuration before constructing [`LabelTransfer`]
//! instances.

use crate::{
    Result,
    error::TractError,
    fiber::MIN_POINTS_PER_FIBER,
    transfer::LabelTransfer,
};

/// Sample count used when the prior's fibers are not already uniform.
pub const DEFAULT_POINTS_PER_FIBER: usize = 2;

/// Configures and constructs [`LabelTransfer`] instances.
///
/// # Examples
/// ```
/// use tractolabel_core::TransferBuilder;
///
/// let transfer = TransferBuilder::new()
///     .with_points_per_fiber(20)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(transfer.points_per_fiber(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct TransferBuilder {
    points_per_fiber: usize,
}

impl Default for TransferBuilder {
    fn default() -> Self {
        Self {
            points_per_fiber: DEFAULT_POINTS_PER_FIBER,
        }
    }
}

impl TransferBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use tractolabel_core::TransferBuilder;
    ///
    /// assert_eq!(TransferBuilder::new().points_per_fiber(), 2);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the fallback sample count per fiber.
    #[must_use]
    pub fn with_points_per_fiber(mut self, points: usize) -> Self {
        self.points_per_fiber = points;
        self
    }

    /// Returns the configured fallback sample count per fiber.
    #[must_use]
    pub fn points_per_fiber(&self) -> usize {
        self.points_per_fiber
    }

    /// Validates the configuration and constructs a [`LabelTransfer`].
    ///
    /// # Errors
    /// Returns [`TractError::InvalidPointsPerFiber`] when fewer than two
    /// samples per fiber were requested.
    ///
    /// # Examples
    /// ```
    /// use tractolabel_core::{TractError, TransferBuilder};
    ///
    /// let err = TransferBuilder::new().with_points_per_fiber(1).build().unwrap_err();
    /// assert_eq!(err, TractError::InvalidPointsPerFiber { got: 1 });
    /// ```
    pub fn build(self) -> Result<LabelTransfer> {
        if self.points_per_fiber < MIN_POINTS_PER_FIBER {
            return Err(TractError::InvalidPointsPerFiber {
                got: self.points_per_fiber,
            });
        }
        Ok(LabelTransfer::new(self.points_per_fiber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn build_rejects_fewer_than_two_samples(#[case] points: usize) {
        let err = TransferBuilder::new()
            .with_points_per_fiber(points)
            .build()
            .expect_err("too few samples must fail");
        assert_eq!(err, TractError::InvalidPointsPerFiber { got: points });
    }

    #[rstest]
    #[case(2)]
    #[case(50)]
    fn build_keeps_requested_samples(#[case] points: usize) {
        let transfer = TransferBuilder::new()
            .with_points_per_fiber(points)
            .build()
            .expect("valid sample count");
        assert_eq!(transfer.points_per_fiber(), points);
    }
}
