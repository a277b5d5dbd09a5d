// ABOUTME: Region-level reconciliation failures.
// ABOUTME: Any of these stops the region before binding and schedule work.

use crate::platform::{ConnectError, PlatformError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
