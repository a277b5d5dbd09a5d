// ABOUTME: Remote function platform abstraction.
// ABOUTME: Capability traits with an AWS implementation and a deterministic in-memory one.

mod aws;
mod context;
mod error;
mod memory;
mod traits;

pub use aws::{AwsConnector, AwsPlatform};
pub use context::{ClientSettings, Credentials, RegionContext};
pub use error::{
    ConnectError, InvalidProxySnafu, MissingCredentialsSnafu, Operation, PlatformError, PlatformErrorKind,
    UnreachableSnafu,
};
pub use memory::{Call, InMemoryConnector, InMemoryPlatform, StoredFunction};
pub use traits::{Connector, EventSourceOps, FunctionOps, Platform, ScheduleOps};
