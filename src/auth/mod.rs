//! Portal authentication.
//!
//! Moodle delegates credentials to a CAS identity provider; see [`cas`].

pub mod cas;

pub use cas::{login, LoginOutcome};
