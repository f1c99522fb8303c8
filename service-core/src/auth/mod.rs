pub mod context;
pub mod token;

pub use context::RequestContext;
pub use token::{Claims, IssuedToken, PrincipalKind, TokenIssuer, TokenVerifier};
