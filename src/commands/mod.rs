// ABOUTME: Command module aggregator for the lambdeploy CLI.
// ABOUTME: Re-exports deploy and package command handlers.

mod deploy;
mod package;

pub use deploy::deploy;
pub use package::package;
