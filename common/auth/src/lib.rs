pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod roles;
pub mod verifier;

pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult};
pub use extractors::{AuthContext, BearerToken};
pub use guards::{ensure_self, GuardError};
pub use roles::{Role, ROLE_ADMIN, ROLE_STANDARD};
pub use verifier::JwtVerifier;
