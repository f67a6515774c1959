//! Error types for the tractolabel core library.
//!
//! Defines the error enum exposed by the public API, its stable error codes
//! and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::cluster::ClusterId;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error type produced while resampling fibers or transferring cluster labels.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TractError {
    /// Fibers need at least two samples so both endpoints survive resampling.
    #[error("points_per_fiber must be at least 2 (got {got})")]
    InvalidPointsPerFiber {
        /// The invalid sample count supplied by the caller.
        got: usize,
    },
    /// A fiber contained no points and cannot be resampled.
    #[error("fiber {fiber} contains no points")]
    EmptyFiber {
        /// Index of the offending fiber.
        fiber: usize,
    },
    /// A per-point channel did not provide one tuple per source point.
    #[error(
        "channel `{channel}` has {actual} values for fiber {fiber} but {expected} were expected"
    )]
    ChannelLengthMismatch {
        /// Name of the offending channel.
        channel: String,
        /// Index of the fiber whose values were malformed.
        fiber: usize,
        /// Number of values implied by the fiber's point count.
        expected: usize,
        /// Number of values actually supplied.
        actual: usize,
    },
    /// Cluster labels must be non-negative.
    #[error("fiber {fiber} carries negative cluster label {label}")]
    NegativeClusterLabel {
        /// Index of the offending fiber.
        fiber: usize,
        /// The raw label read from the dataset.
        label: i64,
    },
    /// Centroid rows were not aligned with the per-fiber labels.
    #[error("{rows} centroid rows were supplied for {labels} cluster labels")]
    CentroidCountMismatch {
        /// Number of per-fiber labels.
        labels: usize,
        /// Number of per-fiber centroid rows.
        rows: usize,
    },
    /// Centroids must have at least one component.
    #[error("centroids must have positive dimension")]
    ZeroCentroidDimension,
    /// Two fibers in the same cluster disagreed about the cluster centroid.
    #[error("fiber {fiber} disagrees with the centroid recorded for cluster {cluster}")]
    InconsistentCentroid {
        /// Cluster whose centroid was contradicted.
        cluster: ClusterId,
        /// Fiber carrying the contradicting row.
        fiber: usize,
    },
    /// The prior had a different number of labels than fibers.
    #[error("prior has {fibers} fibers but {labels} cluster labels")]
    LabelCountMismatch {
        /// Number of fibers in the prior bundle.
        fibers: usize,
        /// Number of labels supplied.
        labels: usize,
    },
    /// A label referenced a cluster with no centroid.
    #[error("cluster {cluster} has no centroid")]
    MissingCentroid {
        /// Cluster lacking a centroid.
        cluster: ClusterId,
    },
    /// The prior and target tractography disagree on fiber count.
    #[error("prior has {prior} fibers but the transformed tractography has {target}")]
    FiberCountMismatch {
        /// Fiber count of the prior.
        prior: usize,
        /// Fiber count of the transformed tractography.
        target: usize,
    },
    /// The prior and target bundles were sampled differently.
    #[error("prior has {prior} points per fiber but the transformed bundle has {target}")]
    SampleCountMismatch {
        /// Points per fiber in the prior.
        prior: usize,
        /// Points per fiber in the transformed bundle.
        target: usize,
    },
    /// The prior tractography contained no fibers.
    #[error("prior tractography contains no fibers")]
    EmptyPrior,
    /// The transformed tractography contained no fibers.
    #[error("transformed tractography contains no fibers")]
    EmptyTarget,
}

define_error_codes! {
    /// Stable codes describing [`TractError`] variants.
    enum TractErrorCode for TractError {
        /// Fibers need at least two samples.
        InvalidPointsPerFiber => InvalidPointsPerFiber { .. } => "TRACT_INVALID_POINTS_PER_FIBER",
        /// A fiber contained no points.
        EmptyFiber => EmptyFiber { .. } => "TRACT_EMPTY_FIBER",
        /// A per-point channel was misaligned with its fiber.
        ChannelLengthMismatch => ChannelLengthMismatch { .. } => "TRACT_CHANNEL_LENGTH_MISMATCH",
        /// Cluster labels must be non-negative.
        NegativeClusterLabel => NegativeClusterLabel { .. } => "TRACT_NEGATIVE_CLUSTER_LABEL",
        /// Centroid rows were not aligned with the labels.
        CentroidCountMismatch => CentroidCountMismatch { .. } => "TRACT_CENTROID_COUNT_MISMATCH",
        /// Centroids must have at least one component.
        ZeroCentroidDimension => ZeroCentroidDimension => "TRACT_ZERO_CENTROID_DIMENSION",
        /// Fibers in one cluster disagreed about the centroid.
        InconsistentCentroid => InconsistentCentroid { .. } => "TRACT_INCONSISTENT_CENTROID",
        /// Label count differed from fiber count.
        LabelCountMismatch => LabelCountMismatch { .. } => "TRACT_LABEL_COUNT_MISMATCH",
        /// A label referenced a cluster without a centroid.
        MissingCentroid => MissingCentroid { .. } => "TRACT_MISSING_CENTROID",
        /// Prior and target fiber counts differ.
        FiberCountMismatch => FiberCountMismatch { .. } => "TRACT_FIBER_COUNT_MISMATCH",
        /// Prior and target sample counts differ.
        SampleCountMismatch => SampleCountMismatch { .. } => "TRACT_SAMPLE_COUNT_MISMATCH",
        /// The prior contained no fibers.
        EmptyPrior => EmptyPrior => "TRACT_EMPTY_PRIOR",
        /// The target contained no fibers.
        EmptyTarget => EmptyTarget => "TRACT_EMPTY_TARGET",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, TractError>;
