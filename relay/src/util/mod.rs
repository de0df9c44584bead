//! Process-level helpers shared by both binaries.

pub mod logging;
pub mod shutdown;

pub use logging::init_logging;
pub use shutdown::shutdown_signal;
