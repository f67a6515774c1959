//! Tractolabel core library.
//!
//! Resamples tractography fibers to a fixed number of points, derives cluster
//! colours from centroids and transfers cluster membership from a prior
//! clustering onto transformed fibers.

mod builder;
mod cluster;
mod error;
mod fiber;
mod transfer;

pub use crate::{
    builder::{DEFAULT_POINTS_PER_FIBER, TransferBuilder},
    cluster::{
        CentroidTable, ClusterId, ClusterLabels, ColourTable, NEUTRAL_GREY, Rgb, cluster_to_rgb,
    },
    error::{Result, TractError, TractErrorCode},
    fiber::{FiberBundle, MIN_POINTS_PER_FIBER, Point, PointChannel, resample_indices},
    transfer::{ClusteredBundle, LabelTransfer, PriorClustering},
};
