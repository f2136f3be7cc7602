mod builder;
mod consumer;
mod producer;

pub use builder::CabBuilder;
pub use consumer::CabConsumer;
pub use producer::Cab;

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::{CabBuffer, CONSUMER_INTERRUPTED_SEQUENCE, MESSAGE_RECEIVED_SEQUENCE}; // re-export for stable path
}

pub use Buffer::{CONSUMER_INTERRUPTED_SEQUENCE, MESSAGE_RECEIVED_SEQUENCE};
