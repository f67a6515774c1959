//! Argument parsing and the label transfer command.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use thiserror::Error;
use tracing::{Span, debug, field, info, instrument};
use tractolabel_core::{
    DEFAULT_POINTS_PER_FIBER, LabelTransfer, PriorClustering, TractError, TractErrorCode,
    TransferBuilder,
};
use tractolabel_providers_vtk::{PolyData, VtkError, read_polydata_path, write_polydata_path};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "tractolabel",
    about = "Copy cluster labels, centroids and colours from a clustered tractography onto its transformed copy."
)]
pub struct Cli {
    /// Clustered tractography carrying `ClusterLabel` and `Centroid` cell data.
    pub in_tract: PathBuf,

    /// Transformed tractography; overwritten with the labelled fibers.
    pub xfm_tract: PathBuf,

    /// Samples per fiber when the prior's fibers differ in length.
    #[arg(
        short = 'p',
        long = "points-per-fiber",
        default_value_t = DEFAULT_POINTS_PER_FIBER,
        value_parser = clap::value_parser!(usize),
    )]
    pub points_per_fiber: usize,

    /// Increase log verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Errors surfaced while executing the transfer.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input path does not exist.
    #[error("input `{path}` does not exist")]
    MissingInput {
        /// Path that was not found.
        path: PathBuf,
        /// Underlying `NotFound` error.
        #[source]
        source: io::Error,
    },
    /// An input path could not be inspected.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing polydata failed.
    #[error(transparent)]
    Vtk(#[from] VtkError),
    /// The label transfer failed.
    #[error(transparent)]
    Core(#[from] TractError),
}

impl CliError {
    /// Returns the stable core error code behind this failure, if any.
    #[must_use]
    pub fn code(&self) -> Option<TractErrorCode> {
        match self {
            Self::Core(err) | Self::Vtk(VtkError::Tract(err)) => Some(err.code()),
            _ => None,
        }
    }
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    /// Prior clustering that supplied the labels.
    pub prior: PathBuf,
    /// Transformed file that was overwritten.
    pub output: PathBuf,
    /// Number of labelled fibers.
    pub fibers: usize,
    /// Number of distinct clusters among them.
    pub clusters: usize,
    /// Samples written per fiber.
    pub points_per_fiber: usize,
}

/// Executes the transfer described by `cli`.
///
/// Both inputs must exist before anything is parsed. The transformed file is
/// only rewritten once the whole transfer has succeeded.
///
/// # Errors
/// Returns [`CliError`] when an input is missing, cannot be parsed, or does not
/// line up with the prior clustering.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use tractolabel_cli::cli::{Cli, run_cli};
/// # use tractolabel_test_support::fixtures::{PolyDataFixture, straight_fiber};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = tempfile::tempdir()?;
/// let prior = PolyDataFixture::new()
///     .line(&straight_fiber(0.0, 3))
///     .cell_field("ClusterLabel", "int", 1, &[4.0])
///     .cell_field("Centroid", "float", 3, &[1.0, 0.0, 0.0])
///     .write_ascii(dir.path(), "prior.vtk")?;
/// let moved = PolyDataFixture::new()
///     .line(&straight_fiber(9.0, 7))
///     .write_ascii(dir.path(), "moved.vtk")?;
/// let cli = Cli {
///     in_tract: prior,
///     xfm_tract: moved,
///     points_per_fiber: 2,
///     verbose: 0,
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!((summary.fibers, summary.clusters, summary.points_per_fiber), (1, 1, 3));
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(
        in_tract = field::Empty,
        xfm_tract = field::Empty,
        points_per_fiber = field::Empty,
    ),
)]
pub fn run_cli(cli: Cli) -> Result<TransferSummary, CliError> {
    let Cli {
        in_tract,
        xfm_tract,
        points_per_fiber,
        ..
    } = cli;
    let span = Span::current();
    span.record("in_tract", field::display(in_tract.display()));
    span.record("xfm_tract", field::display(xfm_tract.display()));

    ensure_input_exists(&in_tract)?;
    ensure_input_exists(&xfm_tract)?;

    let transfer = TransferBuilder::new()
        .with_points_per_fiber(points_per_fiber)
        .build()?;
    let prior = load_prior(&transfer, &in_tract)?;
    span.record(
        "points_per_fiber",
        field::display(prior.bundle().points_per_fiber()),
    );

    let target = load_target(&xfm_tract)?;
    let resampled = transfer.resample_target(&prior, &target.line_points())?;
    let resampled = target.attach_point_channels(resampled)?;
    let clustered = transfer.label(&prior, resampled)?;

    let mut output = PolyData::from_clustered(&clustered, target.preserved_cell_arrays());
    output.title = target.title;
    write_output(&output, &xfm_tract)?;

    let summary = TransferSummary {
        prior: in_tract,
        output: xfm_tract,
        fibers: clustered.bundle().len(),
        clusters: clustered.cluster_count(),
        points_per_fiber: clustered.bundle().points_per_fiber(),
    };
    info!(
        fibers = summary.fibers,
        clusters = summary.clusters,
        "transfer completed"
    );
    Ok(summary)
}

pub(super) fn ensure_input_exists(path: &Path) -> Result<(), CliError> {
    match fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Err(CliError::MissingInput {
            path: path.to_path_buf(),
            source,
        }),
        Err(source) => Err(CliError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[instrument(
    name = "cli.load_prior",
    err,
    skip(transfer),
    fields(path = field::Empty, fibers = field::Empty, clusters = field::Empty),
)]
pub(super) fn load_prior(
    transfer: &LabelTransfer,
    path: &Path,
) -> Result<PriorClustering, CliError> {
    let span = Span::current();
    span.record("path", field::display(path.display()));
    let polydata = read_polydata_path(path)?;
    let fields = polydata.prior_fields()?;
    let prior = transfer.prior_from_lines(
        &polydata.line_points(),
        fields.labels,
        &fields.centroid_rows,
        fields.centroid_dimension,
    )?;
    span.record("fibers", prior.labels().len());
    span.record("clusters", prior.colours().len());
    debug!(
        points_per_fiber = prior.bundle().points_per_fiber(),
        centroid_dimension = prior.centroids().dimension(),
        "prior clustering loaded"
    );
    Ok(prior)
}

#[instrument(
    name = "cli.load_target",
    err,
    fields(path = field::Empty, fibers = field::Empty, points = field::Empty),
)]
pub(super) fn load_target(path: &Path) -> Result<PolyData, CliError> {
    let span = Span::current();
    span.record("path", field::display(path.display()));
    let polydata = read_polydata_path(path)?;
    span.record("fibers", polydata.lines.len());
    span.record("points", polydata.points.len());
    Ok(polydata)
}

#[instrument(
    name = "cli.write_output",
    err,
    skip(polydata),
    fields(path = field::Empty, fibers = polydata.lines.len()),
)]
pub(super) fn write_output(polydata: &PolyData, path: &Path) -> Result<(), CliError> {
    Span::current().record("path", field::display(path.display()));
    write_polydata_path(polydata, path)?;
    Ok(())
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use tractolabel_cli::cli::{TransferSummary, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = TransferSummary {
///     prior: "prior.vtk".into(),
///     output: "moved.vtk".into(),
///     fibers: 12,
///     clusters: 3,
///     points_per_fiber: 20,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.contains("clusters: 3\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &TransferSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "prior: {}", summary.prior.display())?;
    writeln!(writer, "output: {}", summary.output.display())?;
    writeln!(writer, "fibers: {}", summary.fibers)?;
    writeln!(writer, "clusters: {}", summary.clusters)?;
    writeln!(writer, "points per fiber: {}", summary.points_per_fiber)?;
    Ok(())
}
