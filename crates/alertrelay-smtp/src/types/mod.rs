//! Core delivery types.

mod message;
mod reply;

pub use message::Message;
pub use reply::Reply;
