pub mod config;
pub mod logging;

pub mod catalog;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod render;
pub mod scratch;
pub mod store;
pub mod verify;
