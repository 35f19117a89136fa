//! Chat engine entry point: routes a message to its intent handler, queries
//! academic records and phrases the reply.

mod composer;
mod error;
pub mod handlers;
mod settings;

pub use composer::{Composer, Reply};
pub use error::ChatError;
pub use handlers::HandlerOutput;
pub use settings::{ChatSettings, PayloadLinks};
