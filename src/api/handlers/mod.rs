//! API handlers for kustos.
//!
//! `auth` carries the login flow; `me` is the guarded probe for the admin
//! area; `health` and `root` are operational endpoints.

pub mod auth;
pub mod health;
pub mod me;
pub mod root;
