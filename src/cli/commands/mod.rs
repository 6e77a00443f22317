//! CLI command implementations.

mod ask;
mod config;
mod init;
mod serve;
mod status;

pub use ask::run_ask;
pub use config::run_config;
pub use init::run_init;
pub use serve::run_serve;
pub use status::run_status;
