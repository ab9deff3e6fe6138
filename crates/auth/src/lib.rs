//! Who is acting, and what they may do.
//!
//! This crate is intentionally decoupled from HTTP, sessions and storage: the
//! current user is always passed in explicitly by the caller.

pub mod authorize;
pub mod current_user;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, authorize, ensure_owner, require_user};
pub use current_user::CurrentUser;
pub use permissions::Permission;
pub use roles::Role;
