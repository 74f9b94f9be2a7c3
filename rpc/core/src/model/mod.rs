pub mod block;
pub mod message;
pub mod quantity;
pub mod tx;

pub use block::*;
pub use message::*;
pub use quantity::*;
pub use tx::*;
