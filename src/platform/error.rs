// ABOUTME: Platform error types for remote function and binding operations.
// ABOUTME: Connection failures use SNAFU context selectors; call failures use thiserror.

use crate::types::Region;
use snafu::Snafu;
use std::fmt;

/// Remote operations, used to tag errors and to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetFunction,
    CreateFunction,
    UpdateFunctionCode,
    UpdateFunctionConfiguration,
    ListEventSources,
    CreateEventSource,
    UpdateEventSource,
    DeleteEventSource,
    UpsertSchedule,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetFunction => "get function",
            Operation::CreateFunction => "create function",
            Operation::UpdateFunctionCode => "update function code",
            Operation::UpdateFunctionConfiguration => "update function configuration",
            Operation::ListEventSources => "list event sources",
            Operation::CreateEventSource => "create event source",
            Operation::UpdateEventSource => "update event source",
            Operation::DeleteEventSource => "delete event source",
            Operation::UpsertSchedule => "upsert schedule",
        };
        f.write_str(name)
    }
}

/// A remote call that failed after the client's own retries.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{operation} failed: {message}")]
    Api { operation: Operation, message: String },

    #[error("{operation} returned an incomplete response: missing {field}")]
    IncompleteResponse {
        operation: Operation,
        field: &'static str,
    },

    #[error("{operation} rejected request: {message}")]
    InvalidRequest { operation: Operation, message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    Api,
    IncompleteResponse,
    InvalidRequest,
}

impl PlatformError {
    pub fn api(operation: Operation, message: impl Into<String>) -> Self {
        PlatformError::Api {
            operation,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> PlatformErrorKind {
        match self {
            PlatformError::Api { .. } => PlatformErrorKind::Api,
            PlatformError::IncompleteResponse { .. } => PlatformErrorKind::IncompleteResponse,
            PlatformError::InvalidRequest { .. } => PlatformErrorKind::InvalidRequest,
        }
    }

    /// The remote operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            PlatformError::Api { operation, .. }
            | PlatformError::IncompleteResponse { operation, .. }
            | PlatformError::InvalidRequest { operation, .. } => *operation,
        }
    }
}

/// Failure to obtain a platform client for a region.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("no credentials available for region {region}: {message}"))]
    MissingCredentials { region: Region, message: String },

    #[snafu(display("invalid proxy {proxy} for region {region}: {message}"))]
    InvalidProxy {
        region: Region,
        proxy: String,
        message: String,
    },

    #[snafu(display("region {region} is unreachable: {message}"))]
    Unreachable { region: Region, message: String },
}

impl ConnectError {
    pub fn region(&self) -> &Region {
        match self {
            ConnectError::MissingCredentials { region, .. }
            | ConnectError::InvalidProxy { region, .. }
            | ConnectError::Unreachable { region, .. } => region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_reports_operation_and_kind() {
        let err = PlatformError::api(Operation::CreateEventSource, "throttled");
        assert_eq!(err.operation(), Operation::CreateEventSource);
        assert_eq!(err.kind(), PlatformErrorKind::Api);
        assert_eq!(err.to_string(), "create event source failed: throttled");
    }

    #[test]
    fn connect_error_uses_context_selectors() {
        let region = Region::new("eu-west-1").unwrap();
        let err = MissingCredentialsSnafu {
            region: region.clone(),
            message: "no providers in chain",
        }
        .build();
        assert_eq!(err.region(), &region);
        assert!(err.to_string().contains("eu-west-1"));
        assert!(err.to_string().contains("no providers in chain"));
    }
}
