mod config;
mod engine;
mod error;
mod event;
mod health;
mod media;
mod provider;
mod rtc;
mod state;
mod transport;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use health::*;
pub use media::*;
pub use provider::*;
pub use rtc::*;
pub use state::*;
pub use transport::*;
