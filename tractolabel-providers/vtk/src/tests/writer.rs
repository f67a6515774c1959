use super::{DataArray, PolyData, ScalarKind, VtkError, support::*};
use crate::writer::{encode_name, write_polydata, write_polydata_path};
use rstest::{fixture, rstest};

#[fixture]
fn polydata() -> PolyData {
    PolyData {
        title: "written".to_owned(),
        points: vec![[0.0, 0.0, 0.0], [1.5, 0.0, -2.0], [3.0, 0.25, 0.0]],
        lines: vec![vec![0, 1, 2]],
        vertex_cells: 0,
        point_data: vec![DataArray::new(
            "FA",
            ScalarKind::Double,
            1,
            vec![0.1, 0.2, 0.3],
        )],
        cell_data: vec![
            DataArray::new("Colour", ScalarKind::UnsignedChar, 3, vec![255.0, 0.0, 127.0]),
            DataArray::new("ClusterLabel", ScalarKind::Int, 1, vec![4.0]),
            DataArray::new("Fiber Length", ScalarKind::Float, 1, vec![3.5]),
        ],
    }
}

fn render(polydata: &PolyData) -> String {
    let mut out = Vec::new();
    write_polydata(polydata, &mut out).expect("polydata must serialise");
    String::from_utf8(out).expect("writer emits UTF-8")
}

#[rstest]
fn writes_ascii_layout(polydata: PolyData) {
    let text = render(&polydata);
    assert!(text.starts_with("# vtk DataFile Version 4.2\nwritten\nASCII\nDATASET POLYDATA\n"));
    assert!(text.contains("POINTS 3 float\n0 0 0\n1.5 0 -2\n3 0.25 0\n"));
    assert!(text.contains("LINES 1 4\n3 0 1 2\n"));
    assert!(text.contains("CELL_DATA 1\nFIELD FieldData 3\n"));
    assert!(text.contains("Colour 3 1 unsigned_char\n255 0 127\n"));
    assert!(text.contains("Fiber%20Length 1 1 float\n3.5\n"));
    assert!(text.contains("POINT_DATA 3\nFIELD FieldData 1\nFA 1 3 double\n0.1 0.2 0.3\n"));
}

#[rstest]
fn output_reads_back_unchanged(polydata: PolyData) {
    let reread = parse_ok(&render(&polydata));
    assert_eq!(reread, polydata);
}

#[rstest]
#[case::short(ScalarKind::Short, "2")]
#[case::unsigned_long(ScalarKind::UnsignedLong, "2")]
#[case::float(ScalarKind::Float, "1.625")]
#[case::double(ScalarKind::Double, "1.625")]
fn integer_kinds_are_written_rounded(#[case] kind: ScalarKind, #[case] expected: &str) {
    let polydata = PolyData {
        points: vec![[0.0; 3]],
        point_data: vec![DataArray::new("value", kind, 1, vec![1.625])],
        ..PolyData::default()
    };
    let text = render(&polydata);
    let header = format!("value 1 1 {}\n{expected}\n", kind.keyword());
    assert!(text.contains(&header), "{text}");
}

#[rstest]
fn wraps_long_value_runs() {
    let polydata = PolyData {
        points: vec![[0.0; 3]; 10],
        point_data: vec![DataArray::new(
            "index",
            ScalarKind::Int,
            1,
            (0..10).map(f64::from).collect(),
        )],
        ..PolyData::default()
    };
    let text = render(&polydata);
    assert!(text.contains("index 1 10 int\n0 1 2 3 4 5 6 7 8\n9\n"));
}

#[rstest]
fn blank_title_is_replaced(mut polydata: PolyData) {
    polydata.title = "  \n ".to_owned();
    let text = render(&polydata);
    assert!(text.starts_with("# vtk DataFile Version 4.2\ntractography\n"));
}

#[rstest]
fn rejects_array_with_wrong_tuple_count(mut polydata: PolyData) {
    polydata.cell_data[1].values.push(7.0);
    let err = write_polydata(&polydata, Vec::new()).expect_err("mismatch must be rejected");
    assert!(matches!(
        err,
        VtkError::ArrayLengthMismatch { ref name, expected: 1, actual: 2 } if name == "ClusterLabel"
    ));
}

#[rstest]
fn invalid_polydata_leaves_destination_untouched(mut polydata: PolyData) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.vtk");
    std::fs::write(&path, "keep").expect("seed destination");
    polydata.lines = vec![vec![0, 9]];
    let err = write_polydata_path(&polydata, &path).expect_err("bad index must be rejected");
    assert!(matches!(err, VtkError::LineIndexOutOfRange { index: 9, .. }));
    assert_eq!(std::fs::read_to_string(&path).expect("read back"), "keep");
}

#[rstest]
fn write_path_replaces_existing_file(polydata: PolyData) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.vtk");
    std::fs::write(&path, "stale").expect("seed destination");
    write_polydata_path(&polydata, &path).expect("write must succeed");
    let reread = crate::read_polydata_path(&path).expect("written file must parse");
    assert_eq!(reread, polydata);
}

#[rstest]
#[case("Colour", "Colour")]
#[case("Fiber Length", "Fiber%20Length")]
#[case("50%", "50%25")]
#[case("", "unnamed")]
fn encodes_names(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(encode_name(name), expected);
}
