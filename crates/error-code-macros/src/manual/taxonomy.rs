//! Validation of a module-local decode-error taxonomy.
//!
//! A type named `<Type>OpaqueCodeError` replaces the shared
//! `error_code::DecodeError` as the associated error of the generated
//! decoder. The synthesized decoder builds its failures through the
//! `OpaqueCodeError` constructors, so when the decoder itself is generated
//! the taxonomy must implement that capability inside the module.

use syn::Item;

use super::{Subject, TaxonomyOutcome};
use crate::diagnostics::{Diagnostics, FixIt};

pub fn validate_taxonomy(
    subject: &Subject<'_>,
    decoder_synthesized: bool,
    diags: &mut Diagnostics,
) -> TaxonomyOutcome {
    let taxonomy_ident = subject.taxonomy_ident();
    let declared = subject.items.iter().find_map(|item| match item {
        Item::Enum(e) if e.ident == taxonomy_ident => Some(e.ident.clone()),
        Item::Struct(s) if s.ident == taxonomy_ident => Some(s.ident.clone()),
        _ => None,
    });
    let Some(ident) = declared else {
        return TaxonomyOutcome::Shared;
    };

    if decoder_synthesized && !implements_opaque_code_error(subject.items, &ident) {
        diags.error_with_fixits(
            ident.span(),
            "taxonomy_unconforming",
            format!(
                "the generated decoder constructs its failures through the `OpaqueCodeError` \
                 capability, which `{ident}` does not implement in this module"
            ),
            vec![FixIt {
                description: format!("implement the capability for `{ident}`"),
                replacement: format!(
                    "impl ::error_code::OpaqueCodeError for {ident} {{\n    // ...\n}}"
                ),
            }],
        );
    }
    TaxonomyOutcome::Custom(ident)
}

/// Whether the module contains `impl OpaqueCodeError for <ident>`, matching
/// the trait by final path segment.
fn implements_opaque_code_error(items: &[Item], ident: &syn::Ident) -> bool {
    items.iter().any(|item| match item {
        Item::Impl(block) => {
            let Some((_, trait_path, _)) = &block.trait_ else {
                return false;
            };
            let trait_matches = trait_path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "OpaqueCodeError");
            let self_matches = match block.self_ty.as_ref() {
                syn::Type::Path(path) => path
                    .path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident == *ident),
                _ => false,
            };
            trait_matches && self_matches
        }
        _ => false,
    })
}
