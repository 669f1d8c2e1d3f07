use std::fmt;

/// Custom error types for GPMF parsing and GPS track assembly
#[derive(Debug)]
pub enum GpmfError {
    /// I/O errors (exporters)
    Io(std::io::Error),
    /// End of data reached inside a record
    UnexpectedEof,
    /// Unknown KLV type character
    InvalidType(u8),
    /// Structurally inconsistent KLV data
    InvalidData(String),
    /// A required record is absent from a GPS block
    MissingField(&'static str),
    /// Shape or length inconsistency in a GPS payload or scale vector
    MalformedPayload(String),
    /// Fix value outside {0, 2, 3}
    UnknownFixCode(f64),
    /// A GPS block failed to decode or assemble
    Block {
        index: usize,
        source: Box<GpmfError>,
    },
    /// Export format error
    Export(String),
}

impl GpmfError {
    /// Wrap an error with the index of the GPS block it came from
    pub fn in_block(self, index: usize) -> Self {
        match self {
            GpmfError::Block { .. } => self,
            other => GpmfError::Block {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through block wrappers
    pub fn kind(&self) -> &GpmfError {
        match self {
            GpmfError::Block { source, .. } => source.kind(),
            other => other,
        }
    }
}

impl fmt::Display for GpmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpmfError::Io(err) => write!(f, "I/O error: {}", err),
            GpmfError::UnexpectedEof => write!(f, "Unexpected end of data"),
            GpmfError::InvalidType(code) => {
                write!(f, "Invalid KLV type: 0x{:02x} ({:?})", code, *code as char)
            }
            GpmfError::InvalidData(msg) => write!(f, "Invalid KLV data: {}", msg),
            GpmfError::MissingField(tag) => write!(f, "Missing field: {}", tag),
            GpmfError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
            GpmfError::UnknownFixCode(code) => write!(f, "Unknown GPS fix code: {}", code),
            GpmfError::Block { index, source } => write!(f, "GPS block {}: {}", index, source),
            GpmfError::Export(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for GpmfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpmfError::Io(err) => Some(err),
            GpmfError::Block { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GpmfError {
    fn from(err: std::io::Error) -> Self {
        GpmfError::Io(err)
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for GpmfError {
    fn from(err: csv::Error) -> Self {
        GpmfError::Export(err.to_string())
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for GpmfError {
    fn from(err: serde_json::Error) -> Self {
        GpmfError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GpmfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_block_wraps_once() {
        let err = GpmfError::MissingField("SCAL").in_block(3).in_block(7);
        match &err {
            GpmfError::Block { index, .. } => assert_eq!(*index, 3),
            other => panic!("expected block error, got {:?}", other),
        }
        assert!(matches!(err.kind(), GpmfError::MissingField("SCAL")));
        assert_eq!(err.to_string(), "GPS block 3: Missing field: SCAL");
    }
}
