//! Drives the public CLI library against files on disk.
use rstest::rstest;
use tractolabel_cli::cli::{Cli, render_summary, run_cli};
use tractolabel_providers_vtk::read_polydata_path;
use tractolabel_test_support::fixtures::{PolyDataFixture, straight_fiber};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[rstest]
fn binary_target_is_rewritten_as_ascii() -> TestResult {
    let dir = tempfile::tempdir()?;
    let prior = PolyDataFixture::new()
        .line(&straight_fiber(0.0, 3))
        .line(&straight_fiber(1.0, 3))
        .cell_field("ClusterLabel", "int", 1, &[1.0, 0.0])
        .cell_field("Centroid", "float", 2, &[0.0, 1.0, 1.0, 0.0])
        .write_ascii(dir.path(), "prior.vtk")?;
    let target = dir.path().join("moved.vtk");
    let moved = PolyDataFixture::new()
        .line(&straight_fiber(4.0, 10))
        .line(&straight_fiber(5.0, 6))
        .point_field("FA", "float", 1, &[0.5; 16]);
    std::fs::write(&target, moved.render_binary())?;

    let cli = Cli {
        in_tract: prior,
        xfm_tract: target.clone(),
        points_per_fiber: 2,
        verbose: 0,
    };
    let summary = run_cli(cli)?;
    let mut rendered = Vec::new();
    render_summary(&summary, &mut rendered)?;
    let rendered = String::from_utf8(rendered)?;
    assert!(rendered.contains("fibers: 2\n"));
    assert!(rendered.contains("points per fiber: 3\n"));

    let text = std::fs::read_to_string(&target)?;
    assert!(text.starts_with("# vtk DataFile Version 4.2\n"));
    assert!(text.contains("\nASCII\n"));
    let written = read_polydata_path(&target)?;
    let colours = written.cell_array("Colour").ok_or("colour array")?;
    assert_eq!(colours.tuple(0), Some(&[127.0, 255.0, 127.0][..]));
    assert_eq!(colours.tuple(1), Some(&[255.0, 127.0, 127.0][..]));
    let fa = written.point_array("FA").ok_or("point array")?;
    assert_eq!(fa.values, vec![0.5; 6]);
    Ok(())
}
