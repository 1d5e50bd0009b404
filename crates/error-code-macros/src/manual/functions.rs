//! Validators for the four function-shaped manual artifacts: the opaque-code
//! accessor, the decode constructor, and the child encode/decode helpers.

use syn::{FnArg, ImplItemFn, ReturnType, Type};

use super::{
    check_scope, generic_param_has_error_code_bound, is_option, is_str_ref, is_string,
    last_segment_is, bound_is_error_code, result_args, DecoderOutcome, Outcome, Subject,
};
use crate::diagnostics::Diagnostics;

/// `fn opaque_code(&self) -> String`.
pub fn validate_accessor(subject: &Subject<'_>, diags: &mut Diagnostics) -> Outcome {
    let Some(f) = subject.find_fn("opaque_code") else {
        return Outcome::Synthesize;
    };
    let span = f.sig.ident.span();

    // A fallible accessor cannot satisfy the trait and generating the
    // default next to it would silently shadow one with the other.
    if let ReturnType::Type(_, ty) = &f.sig.output {
        if last_segment_is(ty, "Result") {
            diags.error(
                span,
                "manual_accessor_fallible",
                "`opaque_code` must not be fallible; encoding always succeeds and returns `String`",
            );
            return Outcome::Synthesize;
        }
    }
    if f.sig.asyncness.is_some() {
        diags.warning(
            span,
            "manual_accessor_ignored",
            "`opaque_code` is declared `async` and is ignored; the default accessor is generated instead",
        );
        return Outcome::Synthesize;
    }
    match f.sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            diags.warning(
                span,
                "manual_accessor_ignored",
                "`opaque_code` must take `&self` and is ignored; the default accessor is generated instead",
            );
            return Outcome::Synthesize;
        }
    }
    if f.sig.inputs.len() != 1 {
        diags.warning(
            span,
            "manual_accessor_ignored",
            "`opaque_code` must take no parameters besides `&self` and is ignored",
        );
        return Outcome::Synthesize;
    }
    if !f.sig.generics.params.is_empty() || f.sig.generics.where_clause.is_some() {
        diags.warning(
            span,
            "manual_accessor_ignored",
            "`opaque_code` must not be generic and is ignored",
        );
        return Outcome::Synthesize;
    }
    match &f.sig.output {
        ReturnType::Type(_, ty) if is_string(ty) => {}
        _ => {
            diags.warning(
                span,
                "manual_accessor_ignored",
                "`opaque_code` must return `String` and is ignored",
            );
            return Outcome::Synthesize;
        }
    }
    check_scope(
        &subject.vis,
        &f.vis,
        "fn opaque_code(&self) -> String",
        span,
        diags,
    );
    Outcome::Manual
}

/// `fn from_opaque_code(code: &str) -> Result<Self, E>`.
pub fn validate_decoder(subject: &Subject<'_>, diags: &mut Diagnostics) -> DecoderOutcome {
    let Some(f) = subject.find_fn("from_opaque_code") else {
        return DecoderOutcome::Synthesize;
    };
    let span = f.sig.ident.span();

    if let ReturnType::Type(_, ty) = &f.sig.output {
        if is_option(ty) {
            diags.error(
                span,
                "manual_decoder_failable",
                "`from_opaque_code` must not be a failable constructor returning `Option`; \
                 return `Result` so decode failures carry their cause",
            );
            return DecoderOutcome::Synthesize;
        }
    }
    if f.sig.asyncness.is_some() {
        diags.warning(
            span,
            "manual_decoder_ignored",
            "`from_opaque_code` is declared `async` and is ignored; the default constructor is generated instead",
        );
        return DecoderOutcome::Synthesize;
    }
    if f.sig.receiver().is_some() {
        diags.warning(
            span,
            "manual_decoder_ignored",
            "`from_opaque_code` must be an associated function without a receiver and is ignored",
        );
        return DecoderOutcome::Synthesize;
    }
    if !f.sig.generics.params.is_empty() || f.sig.generics.where_clause.is_some() {
        diags.warning(
            span,
            "manual_decoder_ignored",
            "`from_opaque_code` must not be generic and is ignored",
        );
        return DecoderOutcome::Synthesize;
    }
    let params: Vec<&Type> = typed_params(f);
    if params.len() != 1 || !is_str_ref(params[0]) {
        diags.warning(
            span,
            "manual_decoder_ignored",
            "`from_opaque_code` must take a single `&str` parameter and is ignored",
        );
        return DecoderOutcome::Synthesize;
    }
    let err_ty = match &f.sig.output {
        ReturnType::Type(_, ty) => match result_args(ty) {
            Some((ok, err))
                if last_segment_is(ok, "Self") || is_subject_ty(ok, subject) =>
            {
                err.clone()
            }
            _ => {
                diags.warning(
                    span,
                    "manual_decoder_ignored",
                    format!(
                        "`from_opaque_code` must return `Result<{}, _>` and is ignored",
                        subject.ident
                    ),
                );
                return DecoderOutcome::Synthesize;
            }
        },
        ReturnType::Default => {
            diags.warning(
                span,
                "manual_decoder_ignored",
                "`from_opaque_code` must return a `Result` and is ignored",
            );
            return DecoderOutcome::Synthesize;
        }
    };
    check_scope(
        &subject.vis,
        &f.vis,
        "fn from_opaque_code(code: &str) -> Result<Self, _>",
        span,
        diags,
    );
    DecoderOutcome::Manual { err_ty }
}

/// `fn child_opaque_code(code: &str, child: &impl ErrorCode) -> String`, the
/// child parameter in any of the accepted generic spellings.
pub fn validate_child_encode(subject: &Subject<'_>, diags: &mut Diagnostics) -> Outcome {
    let Some(f) = subject.find_fn("child_opaque_code") else {
        return Outcome::Synthesize;
    };
    let span = f.sig.ident.span();

    if f.sig.asyncness.is_some() {
        diags.warning(
            span,
            "manual_child_encode_ignored",
            "`child_opaque_code` is declared `async` and is ignored",
        );
        return Outcome::Synthesize;
    }
    if f.sig.receiver().is_some() {
        diags.warning(
            span,
            "manual_child_encode_ignored",
            "`child_opaque_code` must be an associated function without a receiver and is ignored",
        );
        return Outcome::Synthesize;
    }
    let params = typed_params(f);
    if params.len() != 2 || !is_str_ref(params[0]) {
        diags.warning(
            span,
            "manual_child_encode_ignored",
            "`child_opaque_code` must take `(code: &str, child: &impl ErrorCode)` and is ignored",
        );
        return Outcome::Synthesize;
    }
    if !is_error_code_param(params[1], f) {
        if is_dyn_ref(params[1]) {
            diags.warning(
                span,
                "manual_child_encode_ignored",
                "the error-code capability is not dyn-safe; accept `&impl ErrorCode` or a \
                 bounded generic parameter instead (declaration ignored)",
            );
        } else {
            diags.warning(
                span,
                "manual_child_encode_ignored",
                "`child_opaque_code`'s second parameter must be a reference to a type bound by \
                 `ErrorCode` and is ignored",
            );
        }
        return Outcome::Synthesize;
    }
    match &f.sig.output {
        ReturnType::Type(_, ty) if is_string(ty) => {}
        _ => {
            diags.warning(
                span,
                "manual_child_encode_ignored",
                "`child_opaque_code` must return `String` and is ignored",
            );
            return Outcome::Synthesize;
        }
    }
    Outcome::Manual
}

/// `fn child_error_code<E: ErrorCode>(components: &[&str]) -> Result<E, Err>`.
pub fn validate_child_decode(subject: &Subject<'_>, diags: &mut Diagnostics) -> DecoderOutcome {
    let Some(f) = subject.find_fn("child_error_code") else {
        return DecoderOutcome::Synthesize;
    };
    let span = f.sig.ident.span();

    if f.sig.asyncness.is_some() {
        diags.warning(
            span,
            "manual_child_decode_ignored",
            "`child_error_code` is declared `async` and is ignored",
        );
        return DecoderOutcome::Synthesize;
    }
    if f.sig.receiver().is_some() {
        diags.warning(
            span,
            "manual_child_decode_ignored",
            "`child_error_code` must be an associated function without a receiver and is ignored",
        );
        return DecoderOutcome::Synthesize;
    }
    let Some(child_param) = bounded_type_param(f) else {
        diags.warning(
            span,
            "manual_child_decode_ignored",
            "`child_error_code` must be generic over the child type with an `ErrorCode` bound \
             and is ignored",
        );
        return DecoderOutcome::Synthesize;
    };
    let params = typed_params(f);
    if params.len() != 1 || !is_str_slice_ref(params[0]) {
        diags.warning(
            span,
            "manual_child_decode_ignored",
            "`child_error_code` must take a single `&[&str]` parameter and is ignored",
        );
        return DecoderOutcome::Synthesize;
    }
    let err_ty = match &f.sig.output {
        ReturnType::Type(_, ty) => match result_args(ty) {
            Some((ok, err)) if last_segment_is(ok, &child_param.to_string()) => err.clone(),
            _ => {
                diags.warning(
                    span,
                    "manual_child_decode_ignored",
                    format!(
                        "`child_error_code` must return `Result<{child_param}, _>` and is ignored"
                    ),
                );
                return DecoderOutcome::Synthesize;
            }
        },
        ReturnType::Default => {
            diags.warning(
                span,
                "manual_child_decode_ignored",
                "`child_error_code` must return a `Result` and is ignored",
            );
            return DecoderOutcome::Synthesize;
        }
    };
    DecoderOutcome::Manual { err_ty }
}

fn typed_params(f: &ImplItemFn) -> Vec<&Type> {
    f.sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat) => Some(pat.ty.as_ref()),
            FnArg::Receiver(_) => None,
        })
        .collect()
}

/// Accepted spellings for the child parameter: `&impl ErrorCode`, or a
/// reference to a generic parameter bound by `ErrorCode` inline or in the
/// where clause.
fn is_error_code_param(ty: &Type, f: &ImplItemFn) -> bool {
    let Type::Reference(reference) = ty else {
        return false;
    };
    match reference.elem.as_ref() {
        Type::ImplTrait(impl_trait) => impl_trait.bounds.iter().any(bound_is_error_code),
        Type::Path(path) => path
            .path
            .get_ident()
            .is_some_and(|ident| generic_param_has_error_code_bound(&f.sig.generics, ident)),
        _ => false,
    }
}

fn is_dyn_ref(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => matches!(reference.elem.as_ref(), Type::TraitObject(_)),
        _ => false,
    }
}

fn is_str_slice_ref(ty: &Type) -> bool {
    let Type::Reference(outer) = ty else {
        return false;
    };
    let Type::Slice(slice) = outer.elem.as_ref() else {
        return false;
    };
    is_str_ref(&slice.elem)
}

/// First generic type parameter carrying an `ErrorCode` bound.
fn bounded_type_param(f: &ImplItemFn) -> Option<&syn::Ident> {
    f.sig.generics.params.iter().find_map(|param| match param {
        syn::GenericParam::Type(ty_param)
            if generic_param_has_error_code_bound(&f.sig.generics, &ty_param.ident) =>
        {
            Some(&ty_param.ident)
        }
        _ => None,
    })
}

fn is_subject_ty(ty: &Type, subject: &Subject<'_>) -> bool {
    last_segment_is(ty, &subject.ident.to_string())
}
