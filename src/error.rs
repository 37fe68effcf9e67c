use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use distributor_common::{HexError, TreeError};
use std::fmt;

use crate::transfer::TransferError;

#[derive(Debug)]
pub enum Error {
    AlreadyClaimed { index: u64 },
    ClaimInProgress { index: u64 },
    InvalidProof { index: u64 },
    Transfer(TransferError),
    Tree(TreeError),
    Hex(String),
    RootMismatch { expected: String, actual: String },
    Io(std::io::Error),
    Json(serde_json::Error),
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyClaimed { index } => write!(f, "Drop already claimed: index {index}"),
            Error::ClaimInProgress { index } => {
                write!(f, "Claim in progress: index {index} is being paid out")
            }
            Error::InvalidProof { index } => write!(f, "Invalid proof for index {index}"),
            Error::Transfer(e) => write!(f, "Transfer failed: {e}"),
            Error::Tree(e) => write!(f, "Merkle tree error: {e}"),
            Error::Hex(msg) => write!(f, "Hex error: {msg}"),
            Error::RootMismatch { expected, actual } => write!(
                f,
                "Merkle root mismatch: configured {expected}, allocations produce {actual}"
            ),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transfer(e) => Some(e),
            Error::Tree(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Error::Tree(err)
    }
}

impl From<TransferError> for Error {
    fn from(err: TransferError) -> Self {
        Error::Transfer(err)
    }
}

impl From<HexError> for Error {
    fn from(err: HexError) -> Self {
        Error::Hex(err.to_string())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidProof { .. } | Error::Hex(_) => StatusCode::BAD_REQUEST,
            Error::AlreadyClaimed { .. } => StatusCode::CONFLICT,
            Error::ClaimInProgress { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Tree(TreeError::IndexOutOfRange { .. }) => StatusCode::NOT_FOUND,
            Error::Transfer(_) => StatusCode::BAD_GATEWAY,
            Error::Tree(TreeError::Empty)
            | Error::RootMismatch { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
