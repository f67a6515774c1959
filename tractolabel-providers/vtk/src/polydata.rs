//! In-memory model of a legacy VTK polydata document.
use tractolabel_core::Point;

use crate::errors::VtkError;

/// Scalar storage type named in a VTK data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    UnsignedChar,
    Char,
    UnsignedShort,
    Short,
    UnsignedInt,
    Int,
    UnsignedLong,
    Long,
    Float,
    Double,
}

impl ScalarKind {
    /// Parses a VTK type keyword such as `float` or `vtktypeint64`.
    pub fn parse(keyword: &str) -> Result<Self, VtkError> {
        let kind = match keyword.to_ascii_lowercase().as_str() {
            "unsigned_char" => Self::UnsignedChar,
            "char" => Self::Char,
            "unsigned_short" => Self::UnsignedShort,
            "short" => Self::Short,
            "unsigned_int" => Self::UnsignedInt,
            "int" => Self::Int,
            "unsigned_long" | "vtktypeuint64" | "vtkidtype" => Self::UnsignedLong,
            "long" | "vtktypeint64" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => {
                return Err(VtkError::UnsupportedScalarType {
                    name: keyword.to_owned(),
                });
            }
        };
        Ok(kind)
    }

    /// Keyword written for this kind.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::UnsignedChar => "unsigned_char",
            Self::Char => "char",
            Self::UnsignedShort => "unsigned_short",
            Self::Short => "short",
            Self::UnsignedInt => "unsigned_int",
            Self::Int => "int",
            Self::UnsignedLong => "vtktypeuint64",
            Self::Long => "vtktypeint64",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Width in bytes of one binary value.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::UnsignedChar | Self::Char => 1,
            Self::UnsignedShort | Self::Short => 2,
            Self::UnsignedInt | Self::Int | Self::Float => 4,
            Self::UnsignedLong | Self::Long | Self::Double => 8,
        }
    }

    /// Whether values of this kind are whole numbers.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float | Self::Double)
    }
}

/// Named array of fixed-width tuples attached to points or cells.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub kind: ScalarKind,
    pub components: usize,
    pub values: Vec<f64>,
}

impl DataArray {
    /// Creates an array, taking the values as flattened tuples.
    pub fn new(
        name: impl Into<String>,
        kind: ScalarKind,
        components: usize,
        values: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            components: components.max(1),
            values,
        }
    }

    /// Number of tuples held by the array.
    #[must_use]
    pub fn tuples(&self) -> usize {
        self.values.len() / self.components
    }

    /// Returns tuple `index`.
    #[must_use]
    pub fn tuple(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.components)?;
        self.values.get(start..start + self.components)
    }

    /// Returns a copy restricted to the tuples in `start..end`.
    pub(crate) fn slice_tuples(&self, start: usize, end: usize) -> Self {
        let from = (start * self.components).min(self.values.len());
        let to = (end * self.components).min(self.values.len());
        Self {
            name: self.name.clone(),
            kind: self.kind,
            components: self.components,
            values: self.values[from..to.max(from)].to_vec(),
        }
    }
}

/// Polydata restricted to what tractography needs: points, line cells and
/// their attribute arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolyData {
    pub title: String,
    pub points: Vec<Point>,
    pub lines: Vec<Vec<usize>>,
    /// Vertex cells preceding the lines; cell data is indexed across both.
    pub vertex_cells: usize,
    pub point_data: Vec<DataArray>,
    pub cell_data: Vec<DataArray>,
}

impl PolyData {
    /// Looks up a point array by name.
    #[must_use]
    pub fn point_array(&self, name: &str) -> Option<&DataArray> {
        self.point_data.iter().find(|array| array.name == name)
    }

    /// Looks up a cell array by name.
    #[must_use]
    pub fn cell_array(&self, name: &str) -> Option<&DataArray> {
        self.cell_data.iter().find(|array| array.name == name)
    }

    /// Returns the tuples of cell array `name` that belong to line cells.
    #[must_use]
    pub fn line_cell_array(&self, name: &str) -> Option<DataArray> {
        self.cell_array(name).map(|array| {
            array.slice_tuples(self.vertex_cells, self.vertex_cells + self.lines.len())
        })
    }
}
