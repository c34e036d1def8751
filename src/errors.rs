use thiserror::Error;

use crate::types::{bytes::HexError, fixed::FixedBytesError, quoted::QuotedIntError};

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures of the underlying wire transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("grpc call failed: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("grpc connection failed: {0}")]
    GrpcConnection(#[from] tonic::transport::Error),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("event stream failed: {0}")]
    EventStream(String),
}

/// Errors returned by every operation of the client contract.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("request cancelled")]
    Cancelled,

    #[error("failed to decode {path}: {message}")]
    Decoding { path: String, message: String },

    #[error("invalid state identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid domain type: expected 4 bytes, got {0}")]
    InvalidDomain(usize),

    #[error("invalid fork version: expected 4 bytes, got {0}")]
    ForkVersionInvalid(usize),

    #[error("backend rejected request with status {status}: {message}")]
    BackendRejected { status: u16, message: String },

    #[error("no fork schedule available")]
    NoForkSchedule,

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    pub fn decoding(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Decoding {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// The classified cause, with every operation wrapper removed.
    pub fn root(&self) -> &ClientError {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }

    /// The server's raw rejection message, if the backend rejected the request.
    pub fn rejection_message(&self) -> Option<&str> {
        match self.root() {
            Self::BackendRejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.into())
    }
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        Self::Transport(status.into())
    }
}

impl From<tonic::transport::Error> for ClientError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Transport(err.into())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::Transport(err.into())
    }
}

impl From<FixedBytesError> for ClientError {
    fn from(err: FixedBytesError) -> Self {
        Self::decoding("fixed-length bytes", err)
    }
}

impl From<QuotedIntError> for ClientError {
    fn from(err: QuotedIntError) -> Self {
        Self::decoding("quoted integer", err)
    }
}

impl From<HexError> for ClientError {
    fn from(err: HexError) -> Self {
        Self::decoding("hex string", err)
    }
}

/// Wraps an error with the name of the contract operation that produced it.
pub trait OperationContext<T> {
    fn operation(self, operation: &'static str) -> Result<T>;
}

impl<T, E: Into<ClientError>> OperationContext<T> for std::result::Result<T, E> {
    fn operation(self, operation: &'static str) -> Result<T> {
        self.map_err(|err| ClientError::Operation {
            operation,
            source: Box::new(err.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_wrapping_keeps_root_cause() {
        let result: Result<()> = Err(ClientError::NoForkSchedule);
        let err = result
            .operation("fork_schedule")
            .operation("signature_domain")
            .unwrap_err();

        assert!(matches!(err.root(), ClientError::NoForkSchedule));
        assert_eq!(
            err.to_string(),
            "signature_domain failed: fork_schedule failed: no fork schedule available"
        );
    }

    #[test]
    fn rejection_message_is_surfaced_verbatim() {
        let err: Result<()> = Err(ClientError::BackendRejected {
            status: 400,
            message: "bad attestation".to_string(),
        });
        let err = err.operation("submit_attestation").unwrap_err();
        assert_eq!(err.rejection_message(), Some("bad attestation"));
        assert!(!err.is_cancelled());
    }
}
