/// Middleware module
///
/// Request guards applied to route scopes.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
