//! Typed error hierarchy for leadboard.
//!
//! - `BackendError`: failures talking to the CRM backend (and local won
//!   validation, which is reported the same way a backend rejection is)
//! - `BoardError`: misuse of the board controller or CLI arguments

use thiserror::Error;

use crate::board::models::LeadId;

/// Backend failure taxonomy. Every variant leads to the same recovery
/// (a full board reload); they differ only in the message shown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never reached the server or timed out.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Business-rule rejection (4xx) or local validation failure (`status` is `None`).
    #[error("Rejected: {}", .message.as_deref().unwrap_or("request failed validation"))]
    Validation {
        status: Option<u16>,
        message: Option<String>,
    },

    /// Any other server-side failure.
    #[error("Backend failure{}: {}", .status.map(|s| format!(" ({})", s)).unwrap_or_default(), .message.as_deref().unwrap_or("unknown error"))]
    Unknown {
        status: Option<u16>,
        message: Option<String>,
    },
}

impl BackendError {
    pub fn local_validation(message: impl Into<String>) -> Self {
        Self::Validation {
            status: None,
            message: Some(message.into()),
        }
    }

    /// Message supplied by the server (or the local validator), if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Network { .. } => None,
            Self::Validation { message, .. } | Self::Unknown { message, .. } => message.as_deref(),
        }
    }

    /// Text for the user-visible notification.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Lead {id} is not on the board")]
    UnknownLead { id: LeadId },

    #[error("Invalid stage '{stage}': {message}")]
    InvalidStage { stage: String, message: String },

    #[error("No won confirmation is pending")]
    NoPendingConfirmation,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_prefers_server_message() {
        let err = BackendError::Validation {
            status: Some(400),
            message: Some("Lead already won".to_string()),
        };
        assert_eq!(err.user_message("fallback"), "Lead already won");
        assert!(err.to_string().contains("Lead already won"));
    }

    #[test]
    fn backend_error_falls_back_without_message() {
        let err = BackendError::Unknown {
            status: Some(502),
            message: None,
        };
        assert_eq!(err.user_message("Failed to confirm products."), "Failed to confirm products.");
        assert!(err.to_string().contains("502"));

        let blank = BackendError::Validation {
            status: Some(422),
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message("fallback"), "fallback");
    }

    #[test]
    fn network_error_never_carries_server_message() {
        let err = BackendError::Network {
            message: "connection refused".to_string(),
        };
        assert!(err.server_message().is_none());
        assert!(err.is_network());
        assert_eq!(err.user_message("Failed to update lead status."), "Failed to update lead status.");
    }

    #[test]
    fn local_validation_has_no_status() {
        let err = BackendError::local_validation("Select at least one product");
        assert!(matches!(err, BackendError::Validation { status: None, .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn board_error_wraps_backend_error() {
        let inner = BackendError::Network {
            message: "timeout".into(),
        };
        let err: BoardError = inner.clone().into();
        match err {
            BoardError::Backend(e) => assert_eq!(e, inner),
            other => panic!("Expected Backend, got {:?}", other),
        }
    }

    #[test]
    fn board_error_unknown_lead_carries_id() {
        let err = BoardError::UnknownLead {
            id: LeadId::new("abc"),
        };
        assert!(err.to_string().contains("abc"));
    }
}
