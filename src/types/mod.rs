// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed remote handles plus validated names, regions and runtimes.

mod function_name;
mod id;
mod region;
mod runtime_id;

pub use function_name::{FunctionName, FunctionNameError};
pub use id::{FunctionArn, Id, MappingId, RuleArn};
pub use region::{Region, RegionError};
pub use runtime_id::{RuntimeId, RuntimeIdError, SUPPORTED_RUNTIMES};
