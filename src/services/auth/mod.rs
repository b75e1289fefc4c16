pub mod credentials;
pub mod factory;
pub mod identity;
pub mod jwt;
pub mod role;
pub mod token;

pub use credentials::PasswordHasher;
pub use factory::build_token_service;
pub use identity::{Identity, IdentityLookup, LookupError, RepoIdentityLookup};
pub use jwt::JwtTokenService;
pub use role::Role;
pub use token::{IssuedToken, TokenError, TokenService};
