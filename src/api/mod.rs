pub mod error;
pub mod rest;
pub mod session;
pub mod types;

pub use error::FetchError;
pub use rest::{BizBookerRest, Endpoint, RestSource};
pub use session::Session;
