pub mod models;
pub mod restful;
pub mod wire;
