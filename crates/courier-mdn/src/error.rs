use thiserror::Error;

/// Faults raised while producing a signed MDN.
///
/// Both variants are fatal for the acknowledgment in hand: no partial or
/// unsigned MDN is ever returned. They are kept apart so callers can
/// treat a signing fault (key or certificate misconfiguration, worth
/// alarming on) differently from a content-assembly fault.
#[derive(Debug, Error)]
pub enum MdnError {
    #[error("failed to assemble MDN: {0}")]
    Assembly(String),

    #[error("failed to sign MDN: {0}")]
    Signing(String),
}
