//! Manual-override validation.
//!
//! For each generatable artifact the engine asks: has the user already
//! supplied a hand-written version? Absent, synthesize. Present and valid,
//! use as-is, synthesize nothing for it, no warning. Present but malformed,
//! a diagnostic naming exactly which structural aspect is wrong: a warning
//! where the construct can simply be ignored and the default synthesized
//! alongside (into the trait impl, which never collides with inherent
//! items), an error where generation would be unsafe or ambiguous.
//!
//! Each validator is an ordered list of independent predicate checks, one
//! diagnostic each, evaluated in a fixed priority order.

mod functions;
mod table;
mod taxonomy;

pub use functions::{
    validate_accessor, validate_child_decode, validate_child_encode, validate_decoder,
};
pub use table::validate_table;
pub use taxonomy::validate_taxonomy;

use quote::{format_ident, ToTokens};
use syn::{GenericArgument, Item, ItemImpl, PathArguments, Type, Visibility};

use crate::diagnostics::{Diagnostics, FixIt};

/// Whether an artifact of some kind should be synthesized or the user's
/// declaration used in its place.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Synthesize,
    Manual,
}

/// Outcome for the decode constructor and child-decode helper, which carry
/// the user's chosen error type when valid.
#[derive(Debug)]
pub enum DecoderOutcome {
    Synthesize,
    Manual { err_ty: Type },
}

/// Outcome for the decode-error taxonomy.
#[derive(Debug, PartialEq)]
pub enum TaxonomyOutcome {
    /// Use the shared `error_code::DecodeError`.
    Shared,
    /// Use the module-local taxonomy type.
    Custom(syn::Ident),
}

/// The type under expansion, as seen by the validators.
pub struct Subject<'a> {
    pub ident: syn::Ident,
    pub vis: Visibility,
    pub items: &'a [Item],
}

impl Subject<'_> {
    pub fn table_ident(&self) -> syn::Ident {
        format_ident!("{}OpaqueCode", self.ident)
    }

    pub fn taxonomy_ident(&self) -> syn::Ident {
        format_ident!("{}OpaqueCodeError", self.ident)
    }

    /// Inherent impl blocks targeting the subject type.
    pub fn inherent_impls(&self) -> Vec<&ItemImpl> {
        impls_for(self.items, &self.ident)
    }

    /// First function with the given name across the subject's inherent
    /// impl blocks.
    pub fn find_fn(&self, name: &str) -> Option<&syn::ImplItemFn> {
        self.inherent_impls().into_iter().find_map(|block| {
            block.items.iter().find_map(|item| match item {
                syn::ImplItem::Fn(f) if f.sig.ident == name => Some(f),
                _ => None,
            })
        })
    }
}

/// Inherent impl blocks in `items` whose self type ends in `ident`.
pub(crate) fn impls_for<'a>(items: &'a [Item], ident: &syn::Ident) -> Vec<&'a ItemImpl> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Impl(block) if block.trait_.is_none() && is_path_to(&block.self_ty, ident) => {
                Some(block)
            }
            _ => None,
        })
        .collect()
}

pub(crate) fn is_path_to(ty: &Type, ident: &syn::Ident) -> bool {
    last_segment_is(ty, &ident.to_string())
}

pub(crate) fn last_segment_is(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name),
        _ => false,
    }
}

/// `&str` / `&'static str`, any lifetime, no mutability.
pub(crate) fn is_str_ref(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => {
            reference.mutability.is_none() && last_segment_is(&reference.elem, "str")
        }
        _ => false,
    }
}

pub(crate) fn is_string(ty: &Type) -> bool {
    last_segment_is(ty, "String")
}

/// For `Result<Ok, Err>`, the two type arguments.
pub(crate) fn result_args(ty: &Type) -> Option<(&Type, &Type)> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.arguments_iter();
    let ok = types.next()?;
    let err = types.next()?;
    Some((ok, err))
}

pub(crate) fn is_option(ty: &Type) -> bool {
    last_segment_is(ty, "Option")
}

/// Whether a trait bound names the `ErrorCode` capability (matched by final
/// path segment, so `ErrorCode`, `error_code::ErrorCode` and
/// `::error_code::ErrorCode` all qualify).
pub(crate) fn bound_is_error_code(bound: &syn::TypeParamBound) -> bool {
    match bound {
        syn::TypeParamBound::Trait(trait_bound) => trait_bound
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "ErrorCode"),
        _ => false,
    }
}

/// Whether generic parameter `ident` carries an `ErrorCode` bound, inline or
/// in the where clause. These are the equivalent spellings of "any
/// error-code type" that a manual helper may use.
pub(crate) fn generic_param_has_error_code_bound(
    generics: &syn::Generics,
    ident: &syn::Ident,
) -> bool {
    let inline = generics.params.iter().any(|param| match param {
        syn::GenericParam::Type(ty_param) => {
            ty_param.ident == *ident && ty_param.bounds.iter().any(bound_is_error_code)
        }
        _ => false,
    });
    if inline {
        return true;
    }
    generics
        .where_clause
        .as_ref()
        .map(|clause| {
            clause.predicates.iter().any(|predicate| match predicate {
                syn::WherePredicate::Type(pred) => {
                    last_segment_is(&pred.bounded_ty, &ident.to_string())
                        && pred.bounds.iter().any(bound_is_error_code)
                }
                _ => false,
            })
        })
        .unwrap_or(false)
}

/// Access-scope matching: a manual accessor or constructor must be exactly
/// as visible as the containing type demands. A `pub` type requires `pub`;
/// a restricted type rejects private members but accepts any widening; a
/// private type accepts anything.
pub(crate) fn scope_permits(parent: &Visibility, member: &Visibility) -> bool {
    match parent {
        Visibility::Public(_) => matches!(member, Visibility::Public(_)),
        Visibility::Restricted(_) => !matches!(member, Visibility::Inherited),
        Visibility::Inherited => true,
    }
}

/// Emits the visibility-mismatch error with fix-its widening the declared
/// scope to each valid choice. Returns whether the scope was acceptable.
pub(crate) fn check_scope(
    parent: &Visibility,
    member: &Visibility,
    declaration: &str,
    span: proc_macro2::Span,
    diags: &mut Diagnostics,
) -> bool {
    if scope_permits(parent, member) {
        return true;
    }
    let mut fixits = vec![FixIt {
        description: format!("declare it `pub`: `pub {declaration}`"),
        replacement: String::new(),
    }];
    if let Visibility::Restricted(_) = parent {
        let parent_vis = parent.to_token_stream().to_string().replace(' ', "");
        fixits.insert(
            0,
            FixIt {
                description: format!(
                    "match the type's visibility: `{parent_vis} {declaration}`"
                ),
                replacement: String::new(),
            },
        );
    }
    let parent_vis = match parent {
        Visibility::Public(_) => "pub".to_owned(),
        other => other.to_token_stream().to_string().replace(' ', ""),
    };
    diags.error_with_fixits(
        span,
        "visibility_mismatch",
        format!(
            "`{declaration}` must be at least as visible as the `{parent_vis}` type it belongs to"
        ),
        fixits,
    );
    false
}

// Convenience for iterating only the type arguments of a generic segment.
trait ArgumentsIter {
    fn arguments_iter(&self) -> std::vec::IntoIter<&Type>;
}

impl ArgumentsIter for syn::AngleBracketedGenericArguments {
    fn arguments_iter(&self) -> std::vec::IntoIter<&Type> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect::<Vec<_>>()
            .into_iter()
    }
}

#[cfg(test)]
pub(crate) fn subject_from_mod<'a>(
    ident: &str,
    vis: &str,
    items: &'a [Item],
) -> Subject<'a> {
    let vis = if vis.is_empty() {
        Visibility::Inherited
    } else {
        syn::parse_str(vis).expect("parse visibility")
    };
    Subject {
        ident: format_ident!("{ident}"),
        vis,
        items,
    }
}

#[cfg(test)]
pub(crate) fn parse_mod_items(source: &str) -> Vec<Item> {
    let module: syn::ItemMod = syn::parse_str(source).expect("parse module");
    module.content.expect("inline module").1
}
