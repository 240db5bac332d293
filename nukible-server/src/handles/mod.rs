mod bridge_handle;
mod callback_handle;
mod lock_handle;

pub use bridge_handle::*;
pub use callback_handle::*;
pub use lock_handle::*;
