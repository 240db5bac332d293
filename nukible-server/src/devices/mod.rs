mod device;
mod link;
mod registry;
mod simulated;

pub use device::*;
pub use link::*;
pub use registry::*;
pub use simulated::*;
