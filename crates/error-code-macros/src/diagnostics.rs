//! Diagnostic collection for `#[error_code]`.
//!
//! The engine never aborts on the first problem: every check appends to a
//! [`Diagnostics`] sink in source order, and the emission driver decides at
//! the end whether errors block generation. Errors lower to
//! `compile_error!` invocations; warnings lower to `#[deprecated]` shim
//! functions, the stable-Rust way for a proc macro to surface a warning.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A suggested fix, carried as a full-declaration replacement.
#[derive(Debug, Clone)]
pub struct FixIt {
    pub description: String,
    pub replacement: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Domain-scoped identifier, e.g. `invalid_code_length`.
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub fixits: Vec<FixIt>,
}

impl Diagnostic {
    /// Message as shown to the user, with fix-its appended as help text.
    fn rendered(&self) -> String {
        let mut out = format!("error_code({}): {}", self.code, self.message);
        for fixit in &self.fixits {
            out.push_str("\n\nhelp: ");
            out.push_str(&fixit.description);
            if !fixit.replacement.is_empty() {
                out.push('\n');
                out.push_str(&fixit.replacement);
            }
        }
        out
    }
}

/// Append-only, source-ordered diagnostic sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, span: Span, code: &'static str, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
            fixits: Vec::new(),
        });
    }

    pub fn error_with_fixits(
        &mut self,
        span: Span,
        code: &'static str,
        message: impl Into<String>,
        fixits: Vec<FixIt>,
    ) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
            fixits,
        });
    }

    pub fn warning(&mut self, span: Span, code: &'static str, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
            fixits: Vec::new(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    #[cfg(test)]
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    #[cfg(test)]
    pub fn codes(&self) -> Vec<&'static str> {
        self.items.iter().map(|d| d.code).collect()
    }

    /// One `compile_error!` per error, spanned to the offending construct.
    pub fn error_tokens(&self) -> TokenStream {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| syn::Error::new(d.span, d.rendered()).to_compile_error())
            .collect()
    }

    /// Warning shims: one hidden function per warning whose body uses a
    /// deprecated const, so rustc reports the note at the diagnostic's span.
    pub fn warning_tokens(&self, scope: &syn::Ident) -> TokenStream {
        let shims = self
            .items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .enumerate()
            .map(|(i, d)| {
                let name = format_ident!("__error_code_warning_{}_{}", scope, i);
                let note = d.rendered();
                quote_spanned! {d.span=>
                    #[doc(hidden)]
                    #[allow(dead_code, non_snake_case, clippy::all)]
                    fn #name() {
                        #[deprecated(note = #note)]
                        #[allow(non_upper_case_globals)]
                        const _w: () = ();
                        let _ = _w;
                    }
                }
            });
        quote! { #(#shims)* }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_lower_to_compile_error() {
        let mut diags = Diagnostics::new();
        diags.error(Span::call_site(), "some_code", "something broke");
        assert!(diags.has_errors());
        let tokens = diags.error_tokens().to_string();
        assert!(tokens.contains("compile_error"));
        assert!(tokens.contains("error_code(some_code): something broke"));
    }

    #[test]
    fn warnings_do_not_block() {
        let mut diags = Diagnostics::new();
        diags.warning(Span::call_site(), "soft", "heads up");
        assert!(!diags.has_errors());
        assert!(diags.error_tokens().is_empty());
        let scope = format_ident!("Subject");
        let tokens = diags.warning_tokens(&scope).to_string();
        assert!(tokens.contains("deprecated"));
        assert!(tokens.contains("heads up"));
    }

    #[test]
    fn fixits_render_as_help() {
        let mut diags = Diagnostics::new();
        diags.error_with_fixits(
            Span::call_site(),
            "needs_fix",
            "bad declaration",
            vec![FixIt {
                description: "replace the declaration with".into(),
                replacement: "pub fn opaque_code(&self) -> String".into(),
            }],
        );
        let tokens = diags.error_tokens().to_string();
        assert!(tokens.contains("help: replace the declaration with"));
        assert!(tokens.contains("pub fn opaque_code"));
    }
}
