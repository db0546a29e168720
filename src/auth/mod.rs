//! Authentication and authorization for sixchan.
//!
//! Password hashing, account registration, and the access policy that
//! decides which actor may perform which operation.

mod password;
pub mod policy;
mod registration;
pub mod validation;

pub use password::{hash_password, verify_password, PasswordError};
pub use policy::{permit, Action, Decision, Identity, Target};
pub use registration::{
    authenticate, ensure_admin, register, register_admin, RegistrationRequest,
};
