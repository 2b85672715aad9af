pub mod context;
pub mod error_code;
pub mod pagination;
pub mod response;

pub use context::RequestContext;
pub use error_code::ErrorCode;
pub use pagination::{PaginatedResponse, PaginationInfo, PaginationQuery, clamp_pagination};
pub use response::ApiResponse;
