pub mod error;
pub mod wait;

pub use error::CabError;
pub use wait::WaitStrategy;
