/// Authentication module
///
/// Password hashing, access token minting/verification, refresh token
/// lifecycle, header credential extraction and the flows built on them.

mod claims;
mod extract;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::Claims;
pub use extract::{api_key_matches, extract_api_key, extract_bearer, API_KEY_HEADER};
pub use jwt::AccessTokenCodec;
pub use password::{hash_password, verify_password};
pub use refresh_token::{generate_refresh_token, hash_token, RefreshTokenManager};
pub use service::{AuthService, LoginOutcome};
