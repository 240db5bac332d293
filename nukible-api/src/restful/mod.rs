mod bridge;
mod callback;
mod common;
mod lock;

pub use bridge::*;
pub use callback::*;
pub use common::*;
pub use lock::*;
