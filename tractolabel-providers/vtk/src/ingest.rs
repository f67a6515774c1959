//! Parser for legacy VTK polydata in ASCII or big-endian BINARY encoding.
use std::{fs, io::Read, path::Path};

use tracing::{debug, instrument};
use tractolabel_core::Point;

use crate::errors::VtkError;
use crate::polydata::{DataArray, PolyData, ScalarKind};

const HEADER_PREFIX: &str = "# vtk DataFile Version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Points(usize),
    Cells(usize),
}

/// Byte cursor that reads header lines as text and payloads as ASCII tokens
/// or raw big-endian bytes.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Reads up to the next `\n`, dropping a trailing `\r`.
    fn line(&mut self) -> Result<Option<&'a str>, VtkError> {
        if self.at_end() {
            return Ok(None);
        }
        let start = self.pos;
        let rest = &self.bytes[start..];
        let len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos = (start + len + 1).min(self.bytes.len());
        let raw = &rest[..len];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        std::str::from_utf8(raw)
            .map(Some)
            .map_err(|_| VtkError::InvalidUtf8 { offset: start })
    }

    /// Reads the next line holding anything other than whitespace.
    fn significant_line(&mut self) -> Result<Option<(usize, &'a str)>, VtkError> {
        loop {
            let start = self.pos;
            match self.line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some((start, line.trim()))),
            }
        }
    }

    fn token(&mut self) -> Option<&'a str> {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).ok()
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }
}

/// One header line split into its keyword and arguments.
struct Directive<'a> {
    offset: usize,
    keyword: &'a str,
    args: Vec<&'a str>,
}

impl<'a> Directive<'a> {
    fn split(offset: usize, line: &'a str) -> Self {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        Self {
            offset,
            keyword,
            args: parts.collect(),
        }
    }

    fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    fn arg(&self, index: usize, expected: &'static str) -> Result<&'a str, VtkError> {
        self.args
            .get(index)
            .copied()
            .ok_or_else(|| VtkError::MissingToken {
                keyword: self.keyword.to_owned(),
                expected,
                offset: self.offset,
            })
    }

    fn count(&self, index: usize, expected: &'static str) -> Result<usize, VtkError> {
        let raw = self.arg(index, expected)?;
        raw.parse().map_err(|_| VtkError::MalformedNumber {
            token: raw.to_owned(),
            context: format!("{} {expected}", self.keyword),
        })
    }
}

struct Reader<'a> {
    scanner: Scanner<'a>,
    encoding: Encoding,
    major_version: u32,
    polydata: PolyData,
    section: Option<Section>,
}

/// Reads a legacy VTK polydata document from `reader`.
pub fn read_polydata<R: Read>(mut reader: R) -> Result<PolyData, VtkError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_polydata(&bytes)
}

/// Reads the legacy VTK polydata document stored at `path`.
#[instrument(name = "vtk.read", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_polydata_path(path: impl AsRef<Path>) -> Result<PolyData, VtkError> {
    let bytes = fs::read(path.as_ref())?;
    let polydata = parse_polydata(&bytes)?;
    debug!(
        points = polydata.points.len(),
        lines = polydata.lines.len(),
        cell_arrays = polydata.cell_data.len(),
        point_arrays = polydata.point_data.len(),
        "polydata parsed"
    );
    Ok(polydata)
}

/// Parses a complete legacy VTK polydata document held in memory.
pub fn parse_polydata(bytes: &[u8]) -> Result<PolyData, VtkError> {
    let mut scanner = Scanner::new(bytes);
    let header = scanner.line()?.unwrap_or_default();
    let Some(version) = header.trim().strip_prefix(HEADER_PREFIX) else {
        return Err(VtkError::InvalidHeader {
            found: header.to_owned(),
        });
    };
    let major_version = version
        .trim()
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(3);
    let title = scanner
        .line()?
        .ok_or_else(|| eof("the title line"))?
        .trim()
        .to_owned();

    let (_, encoding_line) = scanner
        .significant_line()?
        .ok_or_else(|| eof("the file encoding"))?;
    let encoding = if encoding_line.eq_ignore_ascii_case("ASCII") {
        Encoding::Ascii
    } else if encoding_line.eq_ignore_ascii_case("BINARY") {
        Encoding::Binary
    } else {
        return Err(VtkError::UnsupportedEncoding {
            found: encoding_line.to_owned(),
        });
    };

    let (offset, dataset_line) = scanner
        .significant_line()?
        .ok_or_else(|| eof("the DATASET line"))?;
    let dataset = Directive::split(offset, dataset_line);
    let kind = dataset.arg(0, "dataset type").unwrap_or_default();
    if !dataset.is("DATASET") || !kind.eq_ignore_ascii_case("POLYDATA") {
        return Err(VtkError::UnsupportedDataset {
            found: dataset_line.to_owned(),
        });
    }

    let mut reader = Reader {
        scanner,
        encoding,
        major_version,
        polydata: PolyData {
            title,
            ..PolyData::default()
        },
        section: None,
    };
    reader.read_body()?;
    reader.finish()
}

impl<'a> Reader<'a> {
    fn read_body(&mut self) -> Result<(), VtkError> {
        while let Some((offset, line)) = self.scanner.significant_line()? {
            let directive = Directive::split(offset, line);
            match directive.keyword.to_ascii_uppercase().as_str() {
                "POINTS" => self.read_points(&directive)?,
                "VERTICES" => {
                    self.polydata.vertex_cells = self.read_cells(&directive)?.len();
                }
                "LINES" => self.polydata.lines = self.read_cells(&directive)?,
                "POLYGONS" | "TRIANGLE_STRIPS" => {
                    self.read_cells(&directive)?;
                }
                "POINT_DATA" => {
                    self.section = Some(Section::Points(directive.count(0, "point count")?));
                }
                "CELL_DATA" => {
                    self.section = Some(Section::Cells(directive.count(0, "cell count")?));
                }
                "FIELD" => self.read_field(&directive)?,
                "METADATA" => self.skip_metadata()?,
                "SCALARS" => self.read_scalars(&directive)?,
                "COLOR_SCALARS" => self.read_color_scalars(&directive)?,
                "VECTORS" | "NORMALS" => self.read_fixed_attribute(&directive, 3, 1)?,
                "TENSORS" => self.read_fixed_attribute(&directive, 9, 1)?,
                "TEXTURE_COORDINATES" => {
                    let dim = directive.count(1, "dimension")?;
                    self.read_fixed_attribute(&directive, dim, 2)?;
                }
                "LOOKUP_TABLE" => self.skip_lookup_table(&directive)?,
                _ => {
                    return Err(VtkError::UnknownKeyword {
                        keyword: directive.keyword.to_owned(),
                        offset,
                    });
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<PolyData, VtkError> {
        let points = self.polydata.points.len();
        for (line, cell) in self.polydata.lines.iter().enumerate() {
            if let Some(&index) = cell.iter().find(|&&index| index >= points) {
                return Err(VtkError::LineIndexOutOfRange {
                    line,
                    index,
                    points,
                });
            }
        }
        if let Some(array) = self
            .polydata
            .point_data
            .iter()
            .find(|array| array.tuples() != points)
        {
            return Err(VtkError::ArrayLengthMismatch {
                name: array.name.clone(),
                expected: points,
                actual: array.tuples(),
            });
        }
        Ok(self.polydata)
    }

    fn read_points(&mut self, directive: &Directive<'_>) -> Result<(), VtkError> {
        let count = directive.count(0, "point count")?;
        let kind = ScalarKind::parse(directive.arg(1, "scalar type")?)?;
        let values = self.read_values(kind, count.saturating_mul(3), "POINTS")?;
        self.polydata.points = values
            .chunks_exact(3)
            .map(|xyz| -> Point { [xyz[0] as f32, xyz[1] as f32, xyz[2] as f32] })
            .collect();
        Ok(())
    }

    fn read_cells(&mut self, directive: &Directive<'_>) -> Result<Vec<Vec<usize>>, VtkError> {
        let section = directive.keyword.to_ascii_uppercase();
        if self.major_version >= 5 {
            self.read_offset_cells(directive, &section)
        } else {
            self.read_legacy_cells(directive, &section)
        }
    }

    fn read_legacy_cells(
        &mut self,
        directive: &Directive<'_>,
        section: &str,
    ) -> Result<Vec<Vec<usize>>, VtkError> {
        let cells = directive.count(0, "cell count")?;
        let size = directive.count(1, "connectivity size")?;
        let raw = self.read_indices(ScalarKind::Int, size, section)?;
        let mut out = Vec::with_capacity(cells.min(raw.len()));
        let mut cursor = 0_usize;
        for _ in 0..cells {
            let Some(&len) = raw.get(cursor) else {
                return Err(VtkError::CellSizeMismatch {
                    section: section.to_owned(),
                    expected: size,
                    actual: cursor,
                });
            };
            let end = cursor.saturating_add(1).saturating_add(len);
            let Some(ids) = raw.get(cursor + 1..end.max(cursor + 1)) else {
                return Err(VtkError::CellSizeMismatch {
                    section: section.to_owned(),
                    expected: size,
                    actual: end,
                });
            };
            out.push(ids.to_vec());
            cursor = end;
        }
        if cursor != size {
            return Err(VtkError::CellSizeMismatch {
                section: section.to_owned(),
                expected: size,
                actual: cursor,
            });
        }
        Ok(out)
    }

    fn read_offset_cells(
        &mut self,
        directive: &Directive<'_>,
        section: &str,
    ) -> Result<Vec<Vec<usize>>, VtkError> {
        let offset_count = directive.count(0, "offset count")?;
        let connectivity_count = directive.count(1, "connectivity size")?;

        let offsets_header = self.expect_directive("OFFSETS")?;
        let offsets_kind = ScalarKind::parse(offsets_header.arg(0, "scalar type")?)?;
        let offsets = self.read_indices(offsets_kind, offset_count, "OFFSETS")?;

        let connectivity_header = self.expect_directive("CONNECTIVITY")?;
        let connectivity_kind = ScalarKind::parse(connectivity_header.arg(0, "scalar type")?)?;
        let connectivity =
            self.read_indices(connectivity_kind, connectivity_count, "CONNECTIVITY")?;

        offsets
            .windows(2)
            .map(|bounds| {
                connectivity
                    .get(bounds[0]..bounds[1])
                    .map(<[usize]>::to_vec)
                    .ok_or_else(|| VtkError::CellSizeMismatch {
                        section: section.to_owned(),
                        expected: connectivity_count,
                        actual: bounds[1],
                    })
            })
            .collect()
    }

    fn expect_directive(&mut self, keyword: &'static str) -> Result<Directive<'a>, VtkError> {
        let (offset, line) = self
            .scanner
            .significant_line()?
            .ok_or_else(|| eof(keyword))?;
        let directive = Directive::split(offset, line);
        if directive.is(keyword) {
            Ok(directive)
        } else {
            Err(VtkError::UnknownKeyword {
                keyword: directive.keyword.to_owned(),
                offset,
            })
        }
    }

    fn tuples_for(&self, keyword: &str) -> Result<usize, VtkError> {
        match self.section {
            Some(Section::Points(count) | Section::Cells(count)) => Ok(count),
            None => Err(VtkError::AttributeOutsideSection {
                keyword: keyword.to_owned(),
            }),
        }
    }

    fn push_attribute(&mut self, array: DataArray) {
        match self.section {
            Some(Section::Points(_)) => self.polydata.point_data.push(array),
            Some(Section::Cells(_)) => self.polydata.cell_data.push(array),
            None => {}
        }
    }

    fn read_scalars(&mut self, directive: &Directive<'_>) -> Result<(), VtkError> {
        let tuples = self.tuples_for("SCALARS")?;
        let name = decode_name(directive.arg(0, "array name")?);
        let kind = ScalarKind::parse(directive.arg(1, "scalar type")?)?;
        let components = match directive.args.get(2) {
            Some(_) => directive.count(2, "component count")?,
            None => 1,
        };
        // The lookup table line is mandatory in legacy files.
        self.expect_directive("LOOKUP_TABLE")?;
        let values = self.read_values(kind, tuples.saturating_mul(components), "SCALARS")?;
        self.push_attribute(DataArray::new(name, kind, components, values));
        Ok(())
    }

    fn read_color_scalars(&mut self, directive: &Directive<'_>) -> Result<(), VtkError> {
        let tuples = self.tuples_for("COLOR_SCALARS")?;
        let name = decode_name(directive.arg(0, "array name")?);
        let components = directive.count(1, "component count")?;
        let kind = match self.encoding {
            Encoding::Ascii => ScalarKind::Float,
            Encoding::Binary => ScalarKind::UnsignedChar,
        };
        let values = self.read_values(kind, tuples.saturating_mul(components), "COLOR_SCALARS")?;
        self.push_attribute(DataArray::new(name, kind, components, values));
        Ok(())
    }

    fn read_fixed_attribute(
        &mut self,
        directive: &Directive<'_>,
        components: usize,
        kind_index: usize,
    ) -> Result<(), VtkError> {
        let keyword = directive.keyword.to_ascii_uppercase();
        let tuples = self.tuples_for(&keyword)?;
        let name = decode_name(directive.arg(0, "array name")?);
        let kind = ScalarKind::parse(directive.arg(kind_index, "scalar type")?)?;
        let values = self.read_values(kind, tuples.saturating_mul(components), &keyword)?;
        self.push_attribute(DataArray::new(name, kind, components, values));
        Ok(())
    }

    fn read_field(&mut self, directive: &Directive<'_>) -> Result<(), VtkError> {
        let arrays = directive.count(1, "array count")?;
        let mut read = 0;
        while read < arrays {
            let (offset, line) = self
                .scanner
                .significant_line()?
                .ok_or_else(|| eof("FIELD arrays"))?;
            let header = Directive::split(offset, line);
            if header.is("METADATA") {
                self.skip_metadata()?;
                continue;
            }
            let name = decode_name(header.keyword);
            let components = header.count(0, "component count")?;
            let tuples = header.count(1, "tuple count")?;
            let kind = ScalarKind::parse(header.arg(2, "scalar type")?)?;
            let values = self.read_values(kind, tuples.saturating_mul(components), &name)?;
            if let Some(Section::Points(expected) | Section::Cells(expected)) = self.section {
                if tuples != expected {
                    return Err(VtkError::ArrayLengthMismatch {
                        name,
                        expected,
                        actual: tuples,
                    });
                }
            }
            // Dataset-level field data outside an attribute section is not
            // tied to points or cells and is dropped.
            self.push_attribute(DataArray::new(name, kind, components, values));
            read += 1;
        }
        Ok(())
    }

    fn skip_metadata(&mut self) -> Result<(), VtkError> {
        while let Some(line) = self.scanner.line()? {
            if line.trim().is_empty() {
                break;
            }
        }
        Ok(())
    }

    fn skip_lookup_table(&mut self, directive: &Directive<'_>) -> Result<(), VtkError> {
        let entries = directive.count(1, "table size")?;
        let kind = match self.encoding {
            Encoding::Ascii => ScalarKind::Float,
            Encoding::Binary => ScalarKind::UnsignedChar,
        };
        self.read_values(kind, entries.saturating_mul(4), "LOOKUP_TABLE")?;
        Ok(())
    }

    fn read_indices(
        &mut self,
        kind: ScalarKind,
        count: usize,
        context: &str,
    ) -> Result<Vec<usize>, VtkError> {
        self.read_values(kind, count, context)?
            .into_iter()
            .map(|value| {
                if value >= 0.0 && value.fract() == 0.0 {
                    Ok(value as usize)
                } else {
                    Err(VtkError::MalformedNumber {
                        token: value.to_string(),
                        context: format!("{context} indices"),
                    })
                }
            })
            .collect()
    }

    fn read_values(
        &mut self,
        kind: ScalarKind,
        count: usize,
        context: &str,
    ) -> Result<Vec<f64>, VtkError> {
        match self.encoding {
            Encoding::Ascii => (0..count)
                .map(|_| {
                    let token = self.scanner.token().ok_or_else(|| eof(context))?;
                    parse_ascii_value(token, context)
                })
                .collect(),
            Encoding::Binary => {
                let width = kind.width();
                let bytes = count
                    .checked_mul(width)
                    .and_then(|len| self.scanner.take(len))
                    .ok_or_else(|| eof(context))?;
                Ok(bytes
                    .chunks_exact(width)
                    .map(|chunk| decode_be(kind, chunk))
                    .collect())
            }
        }
    }
}

fn parse_ascii_value(token: &str, context: &str) -> Result<f64, VtkError> {
    token.parse::<f64>().map_err(|_| VtkError::MalformedNumber {
        token: token.to_owned(),
        context: context.to_owned(),
    })
}

fn decode_be(kind: ScalarKind, chunk: &[u8]) -> f64 {
    fn array<const N: usize>(chunk: &[u8]) -> [u8; N] {
        let mut out = [0_u8; N];
        out.copy_from_slice(&chunk[..N]);
        out
    }
    match kind {
        ScalarKind::UnsignedChar => f64::from(chunk[0]),
        ScalarKind::Char => f64::from(i8::from_be_bytes(array(chunk))),
        ScalarKind::UnsignedShort => f64::from(u16::from_be_bytes(array(chunk))),
        ScalarKind::Short => f64::from(i16::from_be_bytes(array(chunk))),
        ScalarKind::UnsignedInt => f64::from(u32::from_be_bytes(array(chunk))),
        ScalarKind::Int => f64::from(i32::from_be_bytes(array(chunk))),
        ScalarKind::UnsignedLong => u64::from_be_bytes(array(chunk)) as f64,
        ScalarKind::Long => i64::from_be_bytes(array(chunk)) as f64,
        ScalarKind::Float => f64::from(f32::from_be_bytes(array(chunk))),
        ScalarKind::Double => f64::from_be_bytes(array(chunk)),
    }
}

/// Legacy writers escape spaces and other bytes in names as `%XX`.
pub(crate) fn decode_name(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let decoded = (bytes[index] == b'%')
            .then(|| raw.get(index + 1..index + 3))
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match decoded {
            Some(byte) => {
                out.push(byte);
                index += 3;
            }
            None => {
                out.push(bytes[index]);
                index += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn eof(context: &str) -> VtkError {
    VtkError::UnexpectedEof {
        context: context.to_owned(),
    }
}
