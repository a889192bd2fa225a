pub mod error;
pub mod retention;
pub mod store;
