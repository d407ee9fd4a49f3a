//! Local single-user authentication
//!
//! One credential record, one optional session. Not a security boundary.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password};
pub use session::SessionManager;
