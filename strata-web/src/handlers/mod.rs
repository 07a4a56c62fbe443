//! HTTP request handlers for the Strata web server
//!
//! Handlers are organized by resource; each one extracts the authenticated
//! principal, delegates to the application service, and renders the result.

pub mod clusters;
pub mod documents;
pub mod health;
pub mod machines;
pub mod projects;
pub mod references;

pub use clusters::*;
pub use documents::*;
pub use health::*;
pub use machines::*;
pub use projects::*;
pub use references::*;
