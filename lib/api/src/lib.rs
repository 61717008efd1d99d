pub mod rest;
pub mod sessions;

pub use rest::{ApiState, RestApi};
pub use sessions::SessionRegistry;
