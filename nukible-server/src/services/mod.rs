mod callback_service;
mod pairing_service;
mod token_service;

pub use callback_service::*;
pub use pairing_service::*;
pub use token_service::*;
