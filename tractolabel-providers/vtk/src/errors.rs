use thiserror::Error;
use tractolabel_core::TractError;

#[derive(Debug, Error)]
pub enum VtkError {
    #[error("expected a `# vtk DataFile Version` header but found `{found}`")]
    InvalidHeader { found: String },
    #[error("unsupported file encoding `{found}`; expected ASCII or BINARY")]
    UnsupportedEncoding { found: String },
    #[error("unsupported dataset `{found}`; only POLYDATA is supported")]
    UnsupportedDataset { found: String },
    #[error("unknown keyword `{keyword}` at byte {offset}")]
    UnknownKeyword { keyword: String, offset: usize },
    #[error("`{keyword}` at byte {offset} is missing its {expected}")]
    MissingToken {
        keyword: String,
        expected: &'static str,
        offset: usize,
    },
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: String },
    #[error("malformed number `{token}` while reading {context}")]
    MalformedNumber { token: String, context: String },
    #[error("unsupported scalar type `{name}`")]
    UnsupportedScalarType { name: String },
    #[error("header line at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
    #[error("{section} declares {expected} connectivity entries but {actual} were decoded")]
    CellSizeMismatch {
        section: String,
        expected: usize,
        actual: usize,
    },
    #[error("line {line} references point {index} but only {points} points exist")]
    LineIndexOutOfRange {
        line: usize,
        index: usize,
        points: usize,
    },
    #[error("array `{name}` has {actual} tuples but {expected} were expected")]
    ArrayLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("attribute `{keyword}` appears outside POINT_DATA or CELL_DATA")]
    AttributeOutsideSection { keyword: String },
    #[error("line {line} carries cluster label {value}, which is not a whole number in range")]
    InvalidClusterLabel { line: usize, value: f64 },
    #[error("required cell array `{name}` not found")]
    MissingArray { name: String },
    #[error(transparent)]
    Tract(#[from] TractError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
