//! Domain entities - the core business objects.

mod ack;
mod post;

pub use ack::{DeleteAck, InsertAck, UpdateAck};
pub use post::{Attributes, NewPost, Post, PostPatch};
