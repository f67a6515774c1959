//! ASCII legacy VTK 4.2 writer.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, instrument};

use crate::errors::VtkError;
use crate::polydata::{DataArray, PolyData, ScalarKind};

const VALUES_PER_LINE: usize = 9;

/// Writes `polydata` as an ASCII legacy VTK 4.2 document.
pub fn write_polydata<W: Write>(polydata: &PolyData, mut writer: W) -> Result<(), VtkError> {
    validate(polydata)?;
    writeln!(writer, "# vtk DataFile Version 4.2")?;
    writeln!(writer, "{}", sanitise_title(&polydata.title))?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET POLYDATA")?;

    writeln!(writer, "POINTS {} float", polydata.points.len())?;
    for [x, y, z] in &polydata.points {
        writeln!(writer, "{x} {y} {z}")?;
    }

    if !polydata.lines.is_empty() {
        let size: usize = polydata.lines.iter().map(|line| line.len() + 1).sum();
        writeln!(writer, "LINES {} {size}", polydata.lines.len())?;
        for line in &polydata.lines {
            write!(writer, "{}", line.len())?;
            for index in line {
                write!(writer, " {index}")?;
            }
            writeln!(writer)?;
        }
    }

    write_section(&mut writer, "CELL_DATA", polydata.lines.len(), &polydata.cell_data)?;
    write_section(
        &mut writer,
        "POINT_DATA",
        polydata.points.len(),
        &polydata.point_data,
    )?;
    writer.flush()?;
    Ok(())
}

/// Writes `polydata` to `path`, replacing any existing file.
#[instrument(name = "vtk.write", skip_all, fields(path = %path.as_ref().display()))]
pub fn write_polydata_path(polydata: &PolyData, path: impl AsRef<Path>) -> Result<(), VtkError> {
    // Validate before truncating the destination.
    validate(polydata)?;
    let file = File::create(path.as_ref())?;
    write_polydata(polydata, BufWriter::new(file))?;
    debug!(
        points = polydata.points.len(),
        lines = polydata.lines.len(),
        "polydata written"
    );
    Ok(())
}

fn validate(polydata: &PolyData) -> Result<(), VtkError> {
    let points = polydata.points.len();
    for (line, cell) in polydata.lines.iter().enumerate() {
        if let Some(&index) = cell.iter().find(|&&index| index >= points) {
            return Err(VtkError::LineIndexOutOfRange {
                line,
                index,
                points,
            });
        }
    }
    check_arrays(&polydata.cell_data, polydata.lines.len())?;
    check_arrays(&polydata.point_data, points)
}

fn check_arrays(arrays: &[DataArray], expected: usize) -> Result<(), VtkError> {
    match arrays.iter().find(|array| {
        array.tuples() != expected || array.values.len() % array.components != 0
    }) {
        Some(array) => Err(VtkError::ArrayLengthMismatch {
            name: array.name.clone(),
            expected,
            actual: array.tuples(),
        }),
        None => Ok(()),
    }
}

fn write_section<W: Write>(
    writer: &mut W,
    keyword: &str,
    count: usize,
    arrays: &[DataArray],
) -> Result<(), VtkError> {
    if arrays.is_empty() {
        return Ok(());
    }
    writeln!(writer, "{keyword} {count}")?;
    writeln!(writer, "FIELD FieldData {}", arrays.len())?;
    for array in arrays {
        writeln!(
            writer,
            "{} {} {} {}",
            encode_name(&array.name),
            array.components,
            array.tuples(),
            array.kind.keyword()
        )?;
        for chunk in array.values.chunks(VALUES_PER_LINE) {
            let mut first = true;
            for &value in chunk {
                if !first {
                    write!(writer, " ")?;
                }
                first = false;
                match array.kind {
                    kind if kind.is_integer() => write!(writer, "{}", value.round() as i64)?,
                    ScalarKind::Float => write!(writer, "{}", value as f32)?,
                    _ => write!(writer, "{value}")?,
                }
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Escapes whitespace and `%` so names survive whitespace tokenisation.
pub(crate) fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte == b'%' || byte.is_ascii_whitespace() || !byte.is_ascii_graphic() {
            out.push_str(&format!("%{byte:02X}"));
        } else {
            out.push(char::from(byte));
        }
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    out
}

fn sanitise_title(title: &str) -> String {
    let line: String = title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(255)
        .collect();
    if line.trim().is_empty() {
        "tractography".to_owned()
    } else {
        line
    }
}
