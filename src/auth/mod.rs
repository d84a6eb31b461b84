//! Access tokens, their storage, and the portal user model

pub mod models;
pub mod store;
pub mod token;

pub use models::{
    LoginRequest, LoginResponse, PartialUser, RegisterConfirmRequest, RegisterInitRequest,
    UserGroup, UserProfile, UserRole,
};
pub use store::{CookiePolicy, FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{
    decode_token, is_token_expired, is_token_expired_with_leeway, seconds_remaining,
    DecodedToken, TokenClaims, TokenMetadata,
};
