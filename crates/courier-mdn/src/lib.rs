//! Assembly and signing of AS2-style Message Disposition Notifications.
//!
//! An MDN reports back to the sending peer whether a received business
//! document was accepted, warned or rejected. It is a two-part MIME
//! report (human-readable narrative plus machine-readable disposition
//! fields) wrapped in a detached-signature envelope.

pub mod error;
pub mod factory;
pub mod mime;
pub mod sign;

pub use error::MdnError;
pub use factory::{MdnFactory, REPORTING_UA, SignedMdn};
pub use sign::{Ed25519Signer, MdnSigner, SigningCredentials, generate_signing_key};
