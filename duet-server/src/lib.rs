mod config;
mod error;
mod registry;
mod room;
mod signaling;

pub use self::config::*;
pub use error::*;
pub use registry::*;
pub use room::*;
pub use signaling::*;
