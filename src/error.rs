use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use rand_distr::uniform::Error as UniformError;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// The training engine's error type.
#[derive(Debug)]
pub enum TrainErr {
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyNetwork,
    BatchOutOfRange {
        start: usize,
        len: usize,
        total: usize,
    },
    Io(io::Error),
    MalformedData {
        what: &'static str,
        detail: String,
    },
    InvalidConfig(&'static str),
    Json(serde_json::Error),
    ParamGen(String),
    ParamGenExhausted {
        layer: usize,
    },
    WorkerPanicked {
        thread_index: usize,
        message: String,
    },
}

impl TrainErr {
    /// Creates a new `ShapeMismatch` error.
    ///
    /// # Arguments
    /// * `what` - A short description of the mismatched buffer.
    /// * `got` - The length that was received.
    /// * `expected` - The length the network requires.
    pub fn shape(what: &'static str, got: usize, expected: usize) -> Self {
        Self::ShapeMismatch {
            what,
            got,
            expected,
        }
    }

    /// Creates a new `MalformedData` error.
    pub fn malformed<S: Into<String>>(what: &'static str, detail: S) -> Self {
        Self::MalformedData {
            what,
            detail: detail.into(),
        }
    }
}

impl Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch in {what}: got length {got}, expected {expected}"
            ),
            TrainErr::EmptyNetwork => f.write_str("the network has no layers"),
            TrainErr::BatchOutOfRange { start, len, total } => write!(
                f,
                "batch [{start}, {}) is out of range for a dataset of {total} examples",
                start + len
            ),
            TrainErr::Io(e) => write!(f, "io error: {e}"),
            TrainErr::MalformedData { what, detail } => {
                write!(f, "malformed {what}: {detail}")
            }
            TrainErr::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
            TrainErr::Json(e) => write!(f, "json error: {e}"),
            TrainErr::ParamGen(e) => write!(f, "parameter generator error: {e}"),
            TrainErr::ParamGenExhausted { layer } => write!(
                f,
                "the parameter generator ran out of values while building layer {layer}"
            ),
            TrainErr::WorkerPanicked {
                thread_index,
                message,
            } => write!(f, "worker {thread_index} panicked: {message}"),
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Io(e) => Some(e),
            TrainErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrainErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TrainErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<UniformError> for TrainErr {
    fn from(value: UniformError) -> Self {
        Self::ParamGen(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message_names_the_buffer() {
        let err = TrainErr::shape("expected output", 3, 2);
        let msg = err.to_string();

        assert!(msg.contains("expected output"));
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err = TrainErr::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(err.source().is_some());
    }
}
