//! Unit tests for argument parsing and the transfer command.

use super::commands::ensure_input_exists;
use super::{Cli, CliError, TransferSummary, render_summary, run_cli};

use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tractolabel_core::{TractError, TractErrorCode};
use tractolabel_providers_vtk::{VtkError, read_polydata_path};
use tractolabel_test_support::fixtures::{PolyDataFixture, straight_fiber};
use tractolabel_test_support::tracing::RecordingLayer;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[fixture]
fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

/// Three fibers of five points in clusters 2, 8 and 2.
fn prior_fixture() -> PolyDataFixture {
    PolyDataFixture::new()
        .line(&straight_fiber(0.0, 5))
        .line(&straight_fiber(1.0, 5))
        .line(&straight_fiber(2.0, 5))
        .cell_field("ClusterLabel", "int", 1, &[2.0, 8.0, 2.0])
        .cell_field(
            "Centroid",
            "float",
            3,
            &[3.0, 0.0, 0.0, 0.0, 0.0, 0.5, 3.0, 0.0, 0.0],
        )
}

fn target_fixture(fibers: u16) -> PolyDataFixture {
    (0..fibers).fold(PolyDataFixture::new(), |fixture, fiber| {
        fixture.line(&straight_fiber(f32::from(fiber) + 10.0, 4 + fiber))
    })
}

fn cli_for(in_tract: PathBuf, xfm_tract: PathBuf, points_per_fiber: usize) -> Cli {
    Cli {
        in_tract,
        xfm_tract,
        points_per_fiber,
        verbose: 0,
    }
}

fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

#[rstest]
fn clap_applies_defaults() -> TestResult {
    let cli = Cli::try_parse_from(["tractolabel", "prior.vtk", "moved.vtk"])?;
    assert_eq!(cli.in_tract, Path::new("prior.vtk"));
    assert_eq!(cli.xfm_tract, Path::new("moved.vtk"));
    assert_eq!(cli.points_per_fiber, 2);
    assert_eq!(cli.verbose, 0);
    Ok(())
}

#[rstest]
#[case(&["tractolabel", "a.vtk", "b.vtk", "-p", "15", "-vv"], 15, 2)]
#[case(&["tractolabel", "--points-per-fiber", "7", "a.vtk", "b.vtk", "--verbose"], 7, 1)]
fn clap_parses_flags(
    #[case] args: &[&str],
    #[case] points_per_fiber: usize,
    #[case] verbose: u8,
) -> TestResult {
    let cli = Cli::try_parse_from(args.iter().copied())?;
    assert_eq!(cli.points_per_fiber, points_per_fiber);
    assert_eq!(cli.verbose, verbose);
    Ok(())
}

#[rstest]
#[case::missing_target(&["tractolabel", "a.vtk"])]
#[case::non_numeric_samples(&["tractolabel", "a.vtk", "b.vtk", "-p", "many"])]
#[case::negative_samples(&["tractolabel", "a.vtk", "b.vtk", "-p", "-3"])]
fn clap_rejects_bad_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args.iter().copied()).is_err());
}

#[rstest]
fn run_overwrites_target_with_prior_labels(temp_dir: TempDir) -> TestResult {
    let prior = prior_fixture().write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(3)
        .cell_field("Weight", "float", 1, &[0.5, 1.5, 2.5])
        .cell_field("ClusterLabel", "int", 1, &[99.0, 99.0, 99.0])
        .write_ascii(temp_dir.path(), "moved.vtk")?;

    let summary = run_cli(cli_for(prior.clone(), target.clone(), 2))?;
    assert_eq!(
        summary,
        TransferSummary {
            prior,
            output: target.clone(),
            fibers: 3,
            clusters: 2,
            points_per_fiber: 5,
        }
    );

    let written = read_polydata_path(&target)?;
    assert!(written.lines.iter().all(|line| line.len() == 5));
    assert_eq!(written.title, "fixture tractography");
    let labels = written.cell_array("ClusterLabel").ok_or("labels written")?;
    assert_eq!(labels.values, vec![2.0, 8.0, 2.0]);
    let colours = written.cell_array("Colour").ok_or("colours written")?;
    assert_eq!(colours.tuple(0), Some(&[255.0, 127.0, 127.0][..]));
    assert_eq!(colours.tuple(1), Some(&[127.0, 127.0, 255.0][..]));
    let centroids = written.cell_array("Centroid").ok_or("centroids written")?;
    assert_eq!(centroids.tuple(2), Some(&[3.0, 0.0, 0.0][..]));
    let weights = written.cell_array("Weight").ok_or("weights preserved")?;
    assert_eq!(weights.values, vec![0.5, 1.5, 2.5]);
    Ok(())
}

#[rstest]
fn ragged_prior_uses_requested_sample_count(temp_dir: TempDir) -> TestResult {
    let prior = PolyDataFixture::new()
        .line(&straight_fiber(0.0, 3))
        .line(&straight_fiber(1.0, 8))
        .cell_field("ClusterNumber", "int", 1, &[0.0, 1.0])
        .cell_field("Centroid", "float", 1, &[1.0, -1.0])
        .write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(2).write_ascii(temp_dir.path(), "moved.vtk")?;

    let summary = run_cli(cli_for(prior, target.clone(), 6))?;
    assert_eq!(summary.points_per_fiber, 6);
    let written = read_polydata_path(&target)?;
    assert_eq!(written.points.len(), 12);
    Ok(())
}

#[rstest]
fn ragged_prior_rejects_single_sample(temp_dir: TempDir) -> TestResult {
    let prior = PolyDataFixture::new()
        .line(&straight_fiber(0.0, 3))
        .line(&straight_fiber(1.0, 4))
        .cell_field("ClusterLabel", "int", 1, &[0.0, 1.0])
        .cell_field("Centroid", "float", 1, &[1.0, -1.0])
        .write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(2).write_ascii(temp_dir.path(), "moved.vtk")?;

    let err = run_cli_expecting_error(cli_for(prior, target, 1), "one sample is too few");
    assert!(matches!(
        err,
        CliError::Core(TractError::InvalidPointsPerFiber { got: 1 })
    ));
    assert_eq!(err.code(), Some(TractErrorCode::InvalidPointsPerFiber));
    Ok(())
}

#[rstest]
#[case::prior_missing(true)]
#[case::target_missing(false)]
fn missing_input_aborts_before_parsing(temp_dir: TempDir, #[case] prior_missing: bool) -> TestResult {
    let present = target_fixture(1).write_ascii(temp_dir.path(), "present.vtk")?;
    let absent = temp_dir.path().join("absent.vtk");
    let (prior, target) = if prior_missing {
        (absent.clone(), present.clone())
    } else {
        (present.clone(), absent.clone())
    };
    let before = std::fs::read_to_string(&present)?;

    let err = run_cli_expecting_error(cli_for(prior, target, 2), "missing input must abort");
    match &err {
        CliError::MissingInput { path, source } => {
            assert_eq!(path, &absent);
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), None);
    assert_eq!(std::fs::read_to_string(&present)?, before);
    Ok(())
}

#[rstest]
fn ensure_input_exists_accepts_present_file(temp_dir: TempDir) -> TestResult {
    let present = target_fixture(1).write_ascii(temp_dir.path(), "present.vtk")?;
    ensure_input_exists(&present)?;
    Ok(())
}

#[rstest]
fn fiber_count_mismatch_leaves_target_untouched(temp_dir: TempDir) -> TestResult {
    let prior = prior_fixture().write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(2).write_ascii(temp_dir.path(), "moved.vtk")?;
    let before = std::fs::read_to_string(&target)?;

    let err = run_cli_expecting_error(cli_for(prior, target.clone(), 2), "counts differ");
    assert!(matches!(
        err,
        CliError::Core(TractError::FiberCountMismatch {
            prior: 3,
            target: 2
        })
    ));
    assert_eq!(err.code(), Some(TractErrorCode::FiberCountMismatch));
    assert_eq!(std::fs::read_to_string(&target)?, before);
    Ok(())
}

#[rstest]
fn prior_without_labels_is_rejected(temp_dir: TempDir) -> TestResult {
    let prior = target_fixture(3).write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(3).write_ascii(temp_dir.path(), "moved.vtk")?;

    let err = run_cli_expecting_error(cli_for(prior, target, 2), "labels are required");
    assert!(matches!(
        err,
        CliError::Vtk(VtkError::MissingArray { ref name }) if name == "ClusterLabel"
    ));
    Ok(())
}

#[rstest]
fn negative_prior_label_reports_core_code(temp_dir: TempDir) -> TestResult {
    let prior = PolyDataFixture::new()
        .line(&straight_fiber(0.0, 2))
        .cell_field("ClusterLabel", "int", 1, &[-4.0])
        .cell_field("Centroid", "float", 1, &[1.0])
        .write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(1).write_ascii(temp_dir.path(), "moved.vtk")?;

    let err = run_cli_expecting_error(cli_for(prior, target, 2), "negative label");
    assert_eq!(err.code(), Some(TractErrorCode::NegativeClusterLabel));
    Ok(())
}

#[rstest]
fn run_emits_tracing_fields(temp_dir: TempDir) -> TestResult {
    let prior = prior_fixture().write_ascii(temp_dir.path(), "prior.vtk")?;
    let target = target_fixture(3).write_ascii(temp_dir.path(), "moved.vtk")?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    tracing::subscriber::with_default(subscriber, || {
        run_cli(cli_for(prior.clone(), target.clone(), 2))
    })?;

    let run = layer.span_named("cli.run").ok_or("cli.run span must exist")?;
    assert!(
        run.fields
            .get("in_tract")
            .is_some_and(|value| value.ends_with("prior.vtk"))
    );
    assert_eq!(run.fields.get("points_per_fiber"), Some(&"5".to_owned()));

    let load_prior = layer
        .span_named("cli.load_prior")
        .ok_or("cli.load_prior span must exist")?;
    assert_eq!(load_prior.fields.get("fibers"), Some(&"3".to_owned()));
    assert_eq!(load_prior.fields.get("clusters"), Some(&"2".to_owned()));

    let load_target = layer
        .span_named("cli.load_target")
        .ok_or("cli.load_target span must exist")?;
    assert_eq!(load_target.fields.get("points"), Some(&"15".to_owned()));

    let write = layer
        .span_named("cli.write_output")
        .ok_or("cli.write_output span must exist")?;
    assert!(
        write
            .fields
            .get("path")
            .is_some_and(|value| value.ends_with("moved.vtk"))
    );
    assert!(layer.span_named("core.transfer").is_some());
    assert!(layer.has_event(Level::INFO, "transfer completed"));
    Ok(())
}

#[rstest]
fn render_summary_lists_counts() -> TestResult {
    let summary = TransferSummary {
        prior: PathBuf::from("prior.vtk"),
        output: PathBuf::from("moved.vtk"),
        fibers: 3,
        clusters: 2,
        points_per_fiber: 5,
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(
        String::from_utf8(buffer)?,
        "prior: prior.vtk\noutput: moved.vtk\nfibers: 3\nclusters: 2\npoints per fiber: 5\n"
    );
    Ok(())
}
