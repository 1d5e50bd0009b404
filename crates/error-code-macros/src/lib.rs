//! Procedural macro backing the `error-code` crate.
//!
//! This crate provides one macro:
//! - `#[error_code]` - Derive deterministic, reversible opaque codes for an
//!   error enum
//!
//! Use it through the `error-code` crate, which re-exports the attribute next
//! to the `ErrorCode` trait the expansion implements.

use proc_macro::TokenStream;

mod cases;
mod diagnostics;
mod expand;
mod generate;
mod manual;
mod params;

/// Derive deterministic opaque codes for an error enum.
///
/// Apply to an enum, or to an inline module containing the enum plus any
/// hand-written overrides (a code table, accessor, decoder, child helpers or
/// a decode-error taxonomy). With `extend = path::To::Type` the module
/// instead implements for a type declared elsewhere, listing its cases in an
/// `ERROR_CODE_CASES` constant.
///
/// # Arguments
///
/// - `code_length = 4` - Characters per generated code segment
/// - `delimiter = "-"` - Separator between a parent code and its child's
/// - `code_characters = "..."` - Alphabet the codes are drawn from
/// - `extend = path::To::Type` - Implement for an already-declared type
///
/// # Example
///
/// ```ignore
/// #[error_code]
/// pub enum PaymentError {
///     Declined,
///     Gateway(GatewayError),
/// }
///
/// assert_eq!(PaymentError::Declined.opaque_code().len(), 4);
/// ```
#[proc_macro_attribute]
pub fn error_code(args: TokenStream, input: TokenStream) -> TokenStream {
    expand::expand(args.into(), input.into()).into()
}
