//! Authentication and Authorization Module
//!
//! Provides the typed principal context carried through every operation.
//! Claim extraction happens once at the trust boundary (the web layer); from
//! there on the system only sees [`Principal`] and its embedded permission
//! tree.

pub mod principal;

pub use principal::Principal;
