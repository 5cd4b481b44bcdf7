pub mod extract;
pub mod guard;
pub mod session;
pub mod token;

pub use guard::{AccessError, AccessGuard, AuthError, AuthorizedApp, Caller};
pub use token::{TokenError, TokenService};
