mod device;
mod log;
mod state;

pub use device::*;
pub use log::*;
pub use state::*;
