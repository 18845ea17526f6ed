//! Unified error type for the signer's outer surface
//!
//! The `eip712` module reports [`Eip712Error`]; request loading and the CLI
//! report everything through [`SignerError`], which serializes to JSON.

use crate::eip712::Eip712Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for request handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SignerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn verification_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::VerificationFailed, msg)
    }
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SignerError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidPrivateKey,

    // Crypto errors
    EncodingError,
    SigningFailed,
    InvalidSignature,
    VerificationFailed,

    JsonError,

    Io,
}

/// Result type alias for request handling
pub type SignerResult<T> = Result<T, SignerError>;

impl From<Eip712Error> for SignerError {
    fn from(e: Eip712Error) -> Self {
        let code = match e {
            Eip712Error::InvalidKey(_) => ErrorCode::InvalidPrivateKey,
            Eip712Error::EncodingError(_) => ErrorCode::EncodingError,
            Eip712Error::SigningFailure(_) => ErrorCode::SigningFailed,
            Eip712Error::InvalidSignature(_) => ErrorCode::InvalidSignature,
            Eip712Error::InvalidAddress(_) => ErrorCode::InvalidAddress,
            Eip712Error::InvalidJson(_) => ErrorCode::JsonError,
        };
        SignerError::new(code, e.to_string())
    }
}

impl From<std::io::Error> for SignerError {
    fn from(e: std::io::Error) -> Self {
        SignerError::new(ErrorCode::Io, e.to_string())
    }
}
