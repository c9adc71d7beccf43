pub mod auth;
pub mod error;
pub mod identifier;
pub mod response;
pub mod role;

pub use error::AppError;
pub use identifier::ProviderId;
pub use response::ApiResponse;
pub use role::{Gender, Role};
