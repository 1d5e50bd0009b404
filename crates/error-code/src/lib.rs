//! Deterministic, reversible opaque codes for error enums.
//!
//! An "opaque code" is a short, pseudo-random, user-safe string that
//! identifies one case of an error enum, e.g. `"DGj4"`. Codes are derived
//! deterministically from the type and case names, so the same declaration
//! produces the same codes across separate compilations: a code printed in
//! a support ticket months ago still decodes against today's build.
//!
//! The [`error_code`] attribute macro derives both directions:
//!
//! ```ignore
//! use error_code::{error_code, ErrorCode};
//!
//! #[error_code]
//! pub enum PaymentError {
//!     Declined,
//!     Gateway(GatewayError), // nested error-code payload
//! }
//!
//! let code = PaymentError::Declined.opaque_code();
//! let back = PaymentError::from_opaque_code(&code)?;
//! ```
//!
//! A case with a nested error-code payload encodes as
//! `parent code + delimiter + child code`, recursively. Decoding splits on
//! the delimiter, matches the first component against the per-case table and
//! hands the rejoined remainder to the child type's own decoder.

use std::error::Error;

use thiserror::Error;

pub use error_code_macros::error_code;

/// Boxed error carried by wrapped child decode failures.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A type with a reversible opaque string representation.
///
/// Implemented by the [`error_code`] macro; any type exposing exactly this
/// shape is a valid nested child wherever the macro expects one.
pub trait ErrorCode: Sized {
    /// Error returned when an opaque code cannot be decoded.
    type DecodeError: OpaqueCodeError;

    /// The opaque code for this value (including any nested child codes).
    fn opaque_code(&self) -> String;

    /// Reconstructs a value from its opaque code.
    fn from_opaque_code(code: &str) -> Result<Self, Self::DecodeError>;
}

/// Constructors a decode-error taxonomy must provide so that generated
/// decoders can report their terminal states.
///
/// The macro uses [`DecodeError`] unless the annotated module declares its
/// own taxonomy type, which must then implement this trait.
pub trait OpaqueCodeError: Error + Send + Sync + 'static {
    /// The input was empty.
    fn empty_code() -> Self;

    /// The first component did not match any case of the type.
    fn unrecognized_code(code: String) -> Self;

    /// Components remained after matching a case with no child.
    fn unused_components(components: Vec<String>) -> Self;

    /// A nested child type failed to decode its portion of the code.
    fn child_decode_error(case: &'static str, source: BoxError) -> Self;
}

/// Default decode-error taxonomy used by generated decoders.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("opaque code is empty")]
    EmptyCode,

    #[error("unrecognized opaque code `{0}`")]
    UnrecognizedCode(String),

    #[error("opaque code has unused components {0:?}")]
    UnusedComponents(Vec<String>),

    #[error("failed to decode child code for case `{case}`")]
    ChildDecode {
        case: &'static str,
        #[source]
        source: BoxError,
    },
}

impl OpaqueCodeError for DecodeError {
    fn empty_code() -> Self {
        Self::EmptyCode
    }

    fn unrecognized_code(code: String) -> Self {
        Self::UnrecognizedCode(code)
    }

    fn unused_components(components: Vec<String>) -> Self {
        Self::UnusedComponents(components)
    }

    fn child_decode_error(case: &'static str, source: BoxError) -> Self {
        Self::ChildDecode { case, source }
    }
}

/// Composes a parent code segment with a nested child's opaque code.
///
/// Generated accessors call this unless the annotated module supplies its
/// own `child_opaque_code` helper.
pub fn child_opaque_code<E: ErrorCode>(code: &str, delimiter: &str, child: &E) -> String {
    let child_code = child.opaque_code();
    let mut out = String::with_capacity(code.len() + delimiter.len() + child_code.len());
    out.push_str(code);
    out.push_str(delimiter);
    out.push_str(&child_code);
    out
}

/// Rejoins the remaining components of a split opaque code and hands them to
/// the child type's decoder, wrapping any failure in the parent taxonomy.
///
/// Generated decoders call this unless the annotated module supplies its own
/// `child_error_code` helper.
pub fn child_error_code<E, Err>(
    case: &'static str,
    components: &[&str],
    delimiter: &str,
) -> Result<E, Err>
where
    E: ErrorCode,
    Err: OpaqueCodeError,
{
    let joined = components.join(delimiter);
    E::from_opaque_code(&joined).map_err(|e| Err::child_decode_error(case, Box::new(e)))
}
