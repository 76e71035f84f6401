//! Configuration sections.

mod build;
mod paths;
mod php;
mod serve;

pub use build::BuildConfig;
pub use paths::PathsConfig;
pub use php::PhpConfig;
pub use serve::ServeConfig;
