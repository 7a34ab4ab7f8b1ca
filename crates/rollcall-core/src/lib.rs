//! Admission engine for rollcalld
//!
//! This crate decides whether a scan counts as attendance:
//! - GeoClock: great-circle distance and PRESENT / LATE / INVALID classification
//! - Scan tokens: short-lived random tokens with compare-and-swap rotation
//! - Session registry: owner-scoped session lifecycle
//! - Admission engine: token check, duplicate check, classify, commit
//!
//! Every operation takes `now` explicitly; the service passes `rollcall_util::now()`.

mod engine;
mod events;
pub mod geoclock;
mod registry;
mod token;

pub use engine::*;
pub use events::*;
pub use registry::*;
pub use token::*;

use rollcall_api::{AttendanceStatus, ErrorCode, ErrorInfo};
use rollcall_store::StoreError;
use thiserror::Error;

/// Admission errors
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Session not found")]
    NotFound,

    #[error("QR code expired or invalid")]
    ExpiredOrInvalidToken,

    #[error("Session is not active")]
    SessionInactive,

    #[error("Attendance already recorded for this session ({prior_status})")]
    AlreadyRecorded { prior_status: AttendanceStatus },

    #[error("Not authorized")]
    Unauthorized,

    #[error("Store unavailable: {0}")]
    TransientStoreError(#[from] StoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AdmissionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AdmissionError::NotFound => ErrorCode::NotFound,
            AdmissionError::ExpiredOrInvalidToken => ErrorCode::ExpiredOrInvalidToken,
            AdmissionError::SessionInactive => ErrorCode::SessionInactive,
            AdmissionError::AlreadyRecorded { .. } => ErrorCode::AlreadyRecorded,
            AdmissionError::Unauthorized => ErrorCode::Unauthorized,
            AdmissionError::TransientStoreError(_) => ErrorCode::TransientStoreError,
            AdmissionError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        }
    }

    /// Wire form of the error. Store details stay in the service log.
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            AdmissionError::AlreadyRecorded { prior_status } => {
                ErrorInfo::new(self.code(), "Attendance already recorded for this session")
                    .with_prior_status(*prior_status)
            }
            AdmissionError::TransientStoreError(_) => {
                ErrorInfo::new(self.code(), "Temporary storage failure, please retry")
            }
            other => ErrorInfo::new(other.code(), other.to_string()),
        }
    }
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;
