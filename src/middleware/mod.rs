pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, CurrentUser};
pub use extract::{PathId, ValidJson};
pub use response::{ApiResponse, ApiResult};
