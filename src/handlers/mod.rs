//! Request handlers, one module per page family.
//!
//! Every handler receives the viewer (or authenticated user) and the target
//! ids as explicit arguments and applies `policy` itself.

pub mod admin;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod profiles;
