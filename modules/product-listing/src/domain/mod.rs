pub mod error;
pub mod model;
pub mod service;

pub use error::ListingError;
pub use model::{ListingRequest, ListingResult};
pub use service::ListingService;
