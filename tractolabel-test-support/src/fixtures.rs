//! Builders for small legacy VTK tractography documents.
//!
//! The fixtures render files independently of the production writer so
//! reader tests do not depend on the code they are checking.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

/// Named array attached to points or cells of a fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFixture {
    /// Array name.
    pub name: String,
    /// VTK scalar type keyword such as `int` or `float`.
    pub kind: &'static str,
    /// Components per tuple.
    pub components: usize,
    /// Flattened tuple values.
    pub values: Vec<f64>,
}

/// Builder for a polydata document made of line cells.
///
/// # Examples
/// ```
/// use tractolabel_test_support::fixtures::PolyDataFixture;
///
/// let text = PolyDataFixture::new()
///     .line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])
///     .cell_field("ClusterLabel", "int", 1, &[3.0])
///     .render_ascii();
/// assert!(text.contains("LINES 1 3"));
/// assert!(text.contains("ClusterLabel 1 1 int"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolyDataFixture {
    lines: Vec<Vec<[f32; 3]>>,
    cell_fields: Vec<FieldFixture>,
    point_fields: Vec<FieldFixture>,
}

impl PolyDataFixture {
    /// Creates an empty fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line cell made of `points`.
    #[must_use]
    pub fn line(mut self, points: &[[f32; 3]]) -> Self {
        self.lines.push(points.to_vec());
        self
    }

    /// Attaches a per-cell array.
    #[must_use]
    pub fn cell_field(
        mut self,
        name: &str,
        kind: &'static str,
        components: usize,
        values: &[f64],
    ) -> Self {
        self.cell_fields.push(FieldFixture {
            name: name.to_owned(),
            kind,
            components,
            values: values.to_vec(),
        });
        self
    }

    /// Attaches a per-point array.
    #[must_use]
    pub fn point_field(
        mut self,
        name: &str,
        kind: &'static str,
        components: usize,
        values: &[f64],
    ) -> Self {
        self.point_fields.push(FieldFixture {
            name: name.to_owned(),
            kind,
            components,
            values: values.to_vec(),
        });
        self
    }

    fn point_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    fn connectivity_size(&self) -> usize {
        self.point_count() + self.lines.len()
    }

    /// Renders the fixture as an ASCII legacy VTK 4.2 document.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# vtk DataFile Version 4.2");
        let _ = writeln!(out, "fixture tractography");
        let _ = writeln!(out, "ASCII");
        let _ = writeln!(out, "DATASET POLYDATA");
        let _ = writeln!(out, "POINTS {} float", self.point_count());
        for point in self.lines.iter().flatten() {
            let _ = writeln!(out, "{} {} {}", point[0], point[1], point[2]);
        }
        let _ = writeln!(out, "LINES {} {}", self.lines.len(), self.connectivity_size());
        let mut next = 0_usize;
        for line in &self.lines {
            let _ = write!(out, "{}", line.len());
            for _ in line {
                let _ = write!(out, " {next}");
                next += 1;
            }
            out.push('\n');
        }
        render_ascii_section(&mut out, "CELL_DATA", self.lines.len(), &self.cell_fields);
        render_ascii_section(&mut out, "POINT_DATA", self.point_count(), &self.point_fields);
        out
    }

    /// Renders the fixture as a BINARY legacy VTK 4.2 document.
    ///
    /// Payloads are big-endian. Integer kinds are stored as 32-bit integers
    /// and every other kind as 32-bit floats.
    #[must_use]
    pub fn render_binary(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"# vtk DataFile Version 4.2\nfixture tractography\nBINARY\n");
        out.extend_from_slice(b"DATASET POLYDATA\n");
        out.extend_from_slice(format!("POINTS {} float\n", self.point_count()).as_bytes());
        for coordinate in self.lines.iter().flatten().flatten() {
            out.extend_from_slice(&coordinate.to_be_bytes());
        }
        out.extend_from_slice(
            format!("\nLINES {} {}\n", self.lines.len(), self.connectivity_size()).as_bytes(),
        );
        let mut next = 0_i32;
        for line in &self.lines {
            out.extend_from_slice(&i32::try_from(line.len()).unwrap_or(i32::MAX).to_be_bytes());
            for _ in line {
                out.extend_from_slice(&next.to_be_bytes());
                next += 1;
            }
        }
        out.push(b'\n');
        render_binary_section(&mut out, "CELL_DATA", self.lines.len(), &self.cell_fields);
        render_binary_section(&mut out, "POINT_DATA", self.point_count(), &self.point_fields);
        out
    }

    /// Renders the fixture as ASCII and writes it to `dir/name`.
    ///
    /// # Errors
    /// Returns [`io::Error`] when the file cannot be written.
    pub fn write_ascii(&self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, self.render_ascii())?;
        Ok(path)
    }
}

fn is_integer_kind(kind: &str) -> bool {
    !matches!(kind, "float" | "double")
}

fn tuple_count(field: &FieldFixture) -> usize {
    field.values.len() / field.components.max(1)
}

fn render_ascii_section(out: &mut String, keyword: &str, count: usize, fields: &[FieldFixture]) {
    if fields.is_empty() {
        return;
    }
    let _ = writeln!(out, "{keyword} {count}");
    let _ = writeln!(out, "FIELD FieldData {}", fields.len());
    for field in fields {
        let _ = writeln!(
            out,
            "{} {} {} {}",
            field.name,
            field.components,
            tuple_count(field),
            field.kind
        );
        let rendered: Vec<String> = field.values.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "{}", rendered.join(" "));
    }
}

fn render_binary_section(out: &mut Vec<u8>, keyword: &str, count: usize, fields: &[FieldFixture]) {
    if fields.is_empty() {
        return;
    }
    out.extend_from_slice(format!("{keyword} {count}\nFIELD FieldData {}\n", fields.len()).as_bytes());
    for field in fields {
        let kind = if is_integer_kind(field.kind) { "int" } else { "float" };
        out.extend_from_slice(
            format!(
                "{} {} {} {kind}\n",
                field.name,
                field.components,
                tuple_count(field)
            )
            .as_bytes(),
        );
        for &value in &field.values {
            if is_integer_kind(field.kind) {
                out.extend_from_slice(&(value as i32).to_be_bytes());
            } else {
                out.extend_from_slice(&(value as f32).to_be_bytes());
            }
        }
        out.push(b'\n');
    }
}

/// Points of a straight fiber running along x at height `offset`.
///
/// # Examples
/// ```
/// use tractolabel_test_support::fixtures::straight_fiber;
///
/// assert_eq!(straight_fiber(2.0, 3), vec![[0.0, 2.0, 0.0], [1.0, 2.0, 0.0], [2.0, 2.0, 0.0]]);
/// ```
#[must_use]
pub fn straight_fiber(offset: f32, len: u16) -> Vec<[f32; 3]> {
    (0..len).map(|i| [f32::from(i), offset, 0.0]).collect()
}
