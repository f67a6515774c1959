pub(crate) use super::{DataArray, PolyData, ScalarKind, VtkError};

mod support;
mod writer;
