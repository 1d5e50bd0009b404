//! The emission driver behind `#[error_code]`.
//!
//! Resolves configuration, extracts cases, generates codes, runs the
//! manual-override validators and assembles the output: the per-case code
//! table, the `ErrorCode` trait impl, `compile_error!` invocations for every
//! error and deprecated-shim functions for every warning. Errors block
//! generation entirely; the original declaration is always re-emitted so
//! downstream name-resolution errors do not pile on top.

use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{AttrStyle, Item, ItemEnum, ItemMod, Meta, Token, Visibility};

use crate::cases::{self, Case, Child};
use crate::diagnostics::{Diagnostics, FixIt};
use crate::generate::{find_collisions, opaque_code};
use crate::manual::{
    validate_accessor, validate_child_decode, validate_child_encode, validate_decoder,
    validate_table, validate_taxonomy, DecoderOutcome, Outcome, Subject, TaxonomyOutcome,
};
use crate::params::{self, Config};

pub fn expand(args: TokenStream, input: TokenStream) -> TokenStream {
    let metas = match Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args) {
        Ok(metas) => metas,
        Err(err) => {
            let err = err.to_compile_error();
            return quote! { #input #err };
        }
    };
    let item: Item = match syn::parse2(input.clone()) {
        Ok(item) => item,
        Err(err) => {
            let err = err.to_compile_error();
            return quote! { #input #err };
        }
    };

    let mut diags = Diagnostics::new();
    let config = params::resolve(&metas, &mut diags);

    match item {
        Item::Enum(item) => expand_enum(item, config, diags),
        Item::Mod(item) => expand_mod(item, config, diags),
        other => {
            diags.error(
                other.span(),
                "invalid_target",
                "#[error_code] applies to an enum or an inline module containing one",
            );
            let errors = diags.error_tokens();
            quote! { #other #errors }
        }
    }
}

/// Everything the emitter needs, with every decision already made.
struct Plan<'a> {
    /// Simple name used for hash seeds and generated-item naming.
    type_ident: syn::Ident,
    /// The `Self` type of the trait impl. Differs from `type_ident` only in
    /// external-list mode, where it is the full `extend` path.
    subject_ty: TokenStream,
    table_vis: Visibility,
    cases: &'a [Case],
    delimiter: &'a str,
    table: Outcome,
    accessor: Outcome,
    decoder: DecoderOutcome,
    child_encode: Outcome,
    child_decode: Outcome,
    err_ty: TokenStream,
}

fn expand_enum(item: ItemEnum, mut config: Config, mut diags: Diagnostics) -> TokenStream {
    if let Some(path) = &config.extend {
        diags.error(
            path.span(),
            "invalid_extend",
            "`extend` applies to a module; an annotated enum already declares its cases",
        );
    }

    let cases = cases::from_enum(&item, &mut diags);
    let original = item.to_token_stream();
    let Some(cases) = cases else {
        return blocked(original, &item.ident, &diags);
    };
    if diags.has_errors() {
        return blocked(original, &item.ident, &diags);
    }
    params::post_checks(&mut config, cases.iter().any(Case::has_child), &mut diags);

    let plan = Plan {
        type_ident: item.ident.clone(),
        subject_ty: item.ident.to_token_stream(),
        table_vis: item.vis.clone(),
        cases: &cases,
        delimiter: &config.delimiter.value,
        table: Outcome::Synthesize,
        accessor: Outcome::Synthesize,
        decoder: DecoderOutcome::Synthesize,
        child_encode: Outcome::Synthesize,
        child_decode: Outcome::Synthesize,
        err_ty: quote! { ::error_code::DecodeError },
    };

    let expected = expected_table(&plan, &config);
    check_collisions(&plan, &config, &expected, &mut diags);
    check_const_collisions(&plan, &expected, &mut diags);
    if diags.has_errors() {
        return blocked(original, &item.ident, &diags);
    }

    let generated = emit(&plan, &expected);
    let warnings = diags.warning_tokens(&item.ident);
    quote! {
        #original
        #generated
        #warnings
    }
}

fn expand_mod(item: ItemMod, mut config: Config, mut diags: Diagnostics) -> TokenStream {
    let Some((_, items)) = &item.content else {
        diags.error(
            item.ident.span(),
            "non_inline_module",
            "#[error_code] requires an inline module with a body",
        );
        let original = item.to_token_stream();
        return blocked(original, &item.ident, &diags);
    };
    let items = items.clone();

    // Resolve the subject: the extended external type, or the single error
    // enum declared in the module. A module-local decode-error taxonomy is
    // also an enum, so taxonomy names never count as candidates.
    let (type_ident, subject_ty, subject_vis, cases) = match &config.extend {
        Some(path) => {
            let Some(last) = path.segments.last() else {
                diags.error(path.span(), "invalid_extend", "`extend` path is empty");
                return blocked(item.to_token_stream(), &item.ident, &diags);
            };
            let ident = last.ident.clone();
            let cases = cases::from_case_list(&items, path, &mut diags);
            (ident, path.to_token_stream(), Visibility::Inherited, cases)
        }
        None => {
            let candidates: Vec<&ItemEnum> = items
                .iter()
                .filter_map(|i| match i {
                    Item::Enum(e) if !e.ident.to_string().ends_with("OpaqueCodeError") => Some(e),
                    _ => None,
                })
                .collect();
            match candidates.as_slice() {
                [subject] => {
                    let cases = cases::from_enum(subject, &mut diags);
                    (
                        subject.ident.clone(),
                        subject.ident.to_token_stream(),
                        subject.vis.clone(),
                        cases,
                    )
                }
                [] => {
                    diags.error(
                        item.ident.span(),
                        "missing_enum",
                        "the annotated module must declare the error enum, or name an external \
                         type with `extend = path::To::Type`",
                    );
                    return blocked(item.to_token_stream(), &item.ident, &diags);
                }
                _ => {
                    diags.error(
                        item.ident.span(),
                        "multiple_enums",
                        "the annotated module declares more than one enum; annotate each error \
                         enum in its own module",
                    );
                    return blocked(item.to_token_stream(), &item.ident, &diags);
                }
            }
        }
    };

    let Some(cases) = cases else {
        return blocked(item.to_token_stream(), &item.ident, &diags);
    };
    if diags.has_errors() {
        return blocked(item.to_token_stream(), &item.ident, &diags);
    }
    params::post_checks(&mut config, cases.iter().any(Case::has_child), &mut diags);

    let subject = Subject {
        ident: type_ident.clone(),
        vis: subject_vis,
        items: &items,
    };

    let accessor = validate_accessor(&subject, &mut diags);
    let decoder = validate_decoder(&subject, &mut diags);
    let child_encode = validate_child_encode(&subject, &mut diags);
    let decoder_synthesized = matches!(decoder, DecoderOutcome::Synthesize);
    let taxonomy = validate_taxonomy(&subject, decoder_synthesized, &mut diags);

    let err_ty = match (&decoder, &taxonomy) {
        (DecoderOutcome::Manual { err_ty }, _) => err_ty.to_token_stream(),
        (DecoderOutcome::Synthesize, TaxonomyOutcome::Custom(ident)) => ident.to_token_stream(),
        (DecoderOutcome::Synthesize, TaxonomyOutcome::Shared) => {
            quote! { ::error_code::DecodeError }
        }
    };

    // A manual child-decode helper only participates when the decoder itself
    // is generated, and only if it reports through the same error type.
    let child_decode = if decoder_synthesized {
        match validate_child_decode(&subject, &mut diags) {
            DecoderOutcome::Manual { err_ty: helper_err } => {
                if same_final_segment(&helper_err.to_token_stream(), &err_ty) {
                    Outcome::Manual
                } else {
                    diags.warning(
                        type_ident.span(),
                        "manual_child_decode_ignored",
                        format!(
                            "`child_error_code` reports through `{}` but the decoder's error \
                             type is `{}`; the declaration is ignored",
                            helper_err.to_token_stream(),
                            err_ty
                        ),
                    );
                    Outcome::Synthesize
                }
            }
            DecoderOutcome::Synthesize => Outcome::Synthesize,
        }
    } else {
        Outcome::Synthesize
    };

    let mut plan = Plan {
        type_ident,
        subject_ty,
        table_vis: if config.extend.is_some() {
            syn::parse_quote!(pub(crate))
        } else {
            subject.vis.clone()
        },
        cases: &cases,
        delimiter: &config.delimiter.value,
        table: Outcome::Synthesize,
        accessor,
        decoder,
        child_encode,
        child_decode,
        err_ty,
    };

    let expected = expected_table(&plan, &config);
    plan.table = validate_table(&subject, &expected, &mut diags);

    // When every code comes from a hand-written table, generated codes are
    // never consulted and duplicate detection already ran over the table.
    let table_needed = !(plan.accessor == Outcome::Manual
        && matches!(plan.decoder, DecoderOutcome::Manual { .. }));
    if plan.table == Outcome::Synthesize {
        check_collisions(&plan, &config, &expected, &mut diags);
    }
    // Even with a hand-written table, two cases sharing one constant name
    // would leave the second decode arm unreachable.
    check_const_collisions(&plan, &expected, &mut diags);

    if diags.has_errors() {
        return blocked(item.to_token_stream(), &item.ident, &diags);
    }

    let generated = if plan.table == Outcome::Synthesize && !table_needed {
        emit_impl_only(&plan)
    } else {
        emit(&plan, &expected)
    };
    let case_list_use = if config.extend.is_some() {
        // The case list exists to be read here; mark it used.
        let list = format_ident!("{}", cases::CASE_LIST_IDENT);
        quote! { const _: () = { let _ = #list; }; }
    } else {
        TokenStream::new()
    };
    let warnings = diags.warning_tokens(&item.ident);

    let outer_attrs = item
        .attrs
        .iter()
        .filter(|a| matches!(a.style, AttrStyle::Outer));
    let inner_attrs = item
        .attrs
        .iter()
        .filter(|a| matches!(a.style, AttrStyle::Inner(_)));
    let vis = &item.vis;
    let ident = &item.ident;
    quote! {
        #(#outer_attrs)*
        #vis mod #ident {
            #(#inner_attrs)*
            #(#items)*
            #generated
            #case_list_use
            #warnings
        }
    }
}

/// Error path: the untouched declaration plus every diagnostic.
fn blocked(original: TokenStream, scope: &syn::Ident, diags: &Diagnostics) -> TokenStream {
    let errors = diags.error_tokens();
    let warnings = diags.warning_tokens(scope);
    quote! {
        #original
        #errors
        #warnings
    }
}

/// `(const name, generated code)` for every case, in declaration order.
fn expected_table(plan: &Plan<'_>, config: &Config) -> Vec<(syn::Ident, String)> {
    let type_name = plan.type_ident.to_string();
    plan.cases
        .iter()
        .map(|case| {
            let code = opaque_code(
                &case.seed(&type_name),
                config.code_length.value,
                &config.alphabet.value,
            );
            (case.const_ident(), code)
        })
        .collect()
}

fn check_collisions(
    plan: &Plan<'_>,
    config: &Config,
    expected: &[(syn::Ident, String)],
    diags: &mut Diagnostics,
) {
    let codes: Vec<(syn::Ident, String)> = plan
        .cases
        .iter()
        .zip(expected)
        .map(|(case, (_, code))| (case.ident.clone(), code.clone()))
        .collect();
    for collision in find_collisions(&codes) {
        let names = collision
            .cases
            .iter()
            .map(|c| format!("`{c}`"))
            .collect::<Vec<_>>()
            .join(", ");
        let longer = config.code_length.value + 1;
        let table_ident = format_ident!("{}OpaqueCode", plan.type_ident);
        let consts = expected
            .iter()
            .map(|(name, code)| format!("    pub const {name}: &'static str = \"{code}\";"))
            .collect::<Vec<_>>()
            .join("\n");
        diags.error_with_fixits(
            collision.span,
            "code_collision",
            format!(
                "cases {names} all generate the opaque code \"{}\"; codes must be unique within \
                 `{}`",
                collision.code, plan.type_ident
            ),
            vec![
                FixIt {
                    description: "widen the code space with a longer code length".to_owned(),
                    replacement: format!("#[error_code(code_length = {longer})]"),
                },
                FixIt {
                    description: "pin every code explicitly with a manual table".to_owned(),
                    replacement: format!("struct {table_ident};\nimpl {table_ident} {{\n{consts}\n}}"),
                },
            ],
        );
    }
}

/// Case names are upper-snaked into table constants, so `value1` and
/// `Value1` would both declare `VALUE1`. Catch that here rather than let the
/// duplicate constants surface as a bare name-resolution error.
fn check_const_collisions(
    plan: &Plan<'_>,
    expected: &[(syn::Ident, String)],
    diags: &mut Diagnostics,
) {
    let consts: Vec<(syn::Ident, String)> = plan
        .cases
        .iter()
        .zip(expected)
        .map(|(case, (konst, _))| (case.ident.clone(), konst.to_string()))
        .collect();
    for collision in find_collisions(&consts) {
        // Identical case names already report as a code collision.
        if collision.cases.windows(2).all(|w| w[0] == w[1]) {
            continue;
        }
        let names = collision
            .cases
            .iter()
            .map(|c| format!("`{c}`"))
            .collect::<Vec<_>>()
            .join(", ");
        diags.error(
            collision.span,
            "const_collision",
            format!(
                "cases {names} all map to the table constant `{}`; rename one of them so the \
                 upper-cased names stay distinct",
                collision.code
            ),
        );
    }
}

/// Full emission: code table (unless hand-written) plus the trait impl.
fn emit(plan: &Plan<'_>, expected: &[(syn::Ident, String)]) -> TokenStream {
    let table = if plan.table == Outcome::Synthesize {
        let table_ident = format_ident!("{}OpaqueCode", plan.type_ident);
        let vis = &plan.table_vis;
        let names = expected.iter().map(|(name, _)| name);
        let codes = expected.iter().map(|(_, code)| code);
        quote! {
            #vis struct #table_ident;

            impl #table_ident {
                #( #vis const #names: &'static str = #codes; )*
            }
        }
    } else {
        TokenStream::new()
    };
    let trait_impl = emit_impl_only(plan);
    quote! {
        #table
        #trait_impl
    }
}

fn emit_impl_only(plan: &Plan<'_>) -> TokenStream {
    let subject_ty = &plan.subject_ty;
    let err_ty = &plan.err_ty;
    let encode_body = encode_body(plan);
    let decode_body = decode_body(plan);
    quote! {
        #[automatically_derived]
        impl ::error_code::ErrorCode for #subject_ty {
            type DecodeError = #err_ty;

            fn opaque_code(&self) -> ::std::string::String {
                #encode_body
            }

            fn from_opaque_code(code: &str) -> ::std::result::Result<Self, Self::DecodeError> {
                #decode_body
            }
        }
    }
}

fn encode_body(plan: &Plan<'_>) -> TokenStream {
    if plan.accessor == Outcome::Manual {
        // Inherent items win path resolution, so this resolves to the
        // hand-written accessor, not back into the trait.
        return quote! { Self::opaque_code(self) };
    }
    if plan.cases.is_empty() {
        return quote! { match *self {} };
    }
    let table = format_ident!("{}OpaqueCode", plan.type_ident);
    let delimiter = plan.delimiter;
    let arms = plan.cases.iter().map(|case| {
        let ident = &case.ident;
        let konst = case.const_ident();
        match &case.child {
            Child::None => {
                let suffix = case.empty_suffix();
                quote! {
                    Self::#ident #suffix => ::std::borrow::ToOwned::to_owned(#table::#konst),
                }
            }
            Child::Unnamed => {
                let call = child_encode_call(plan, &table, &konst, delimiter);
                quote! { Self::#ident(child) => #call, }
            }
            Child::Named(field) => {
                let call = child_encode_call(plan, &table, &konst, delimiter);
                quote! { Self::#ident { #field: child } => #call, }
            }
        }
    });
    quote! {
        match self {
            #(#arms)*
        }
    }
}

fn child_encode_call(
    plan: &Plan<'_>,
    table: &syn::Ident,
    konst: &syn::Ident,
    delimiter: &str,
) -> TokenStream {
    if plan.child_encode == Outcome::Manual {
        quote! { Self::child_opaque_code(#table::#konst, child) }
    } else {
        quote! { ::error_code::child_opaque_code(#table::#konst, #delimiter, child) }
    }
}

fn decode_body(plan: &Plan<'_>) -> TokenStream {
    if matches!(plan.decoder, DecoderOutcome::Manual { .. }) {
        return quote! { Self::from_opaque_code(code) };
    }
    let err_ty = &plan.err_ty;
    let empty = quote! {
        <#err_ty as ::error_code::OpaqueCodeError>::empty_code()
    };
    let unrecognized = quote! {
        <#err_ty as ::error_code::OpaqueCodeError>::unrecognized_code(
            ::std::borrow::ToOwned::to_owned(code),
        )
    };
    if plan.cases.is_empty() {
        return quote! {
            if code.is_empty() {
                ::std::result::Result::Err(#empty)
            } else {
                ::std::result::Result::Err(#unrecognized)
            }
        };
    }

    let table = format_ident!("{}OpaqueCode", plan.type_ident);
    let delimiter = plan.delimiter;
    let arms: Vec<TokenStream> = plan
        .cases
        .iter()
        .map(|case| {
            let ident = &case.ident;
            let konst = case.const_ident();
            let construct = match &case.child {
                Child::None => {
                    let suffix = case.empty_suffix();
                    return quote! {
                        if first == #table::#konst {
                            if rest.is_empty() {
                                ::std::result::Result::Ok(Self::#ident #suffix)
                            } else {
                                ::std::result::Result::Err(
                                    <#err_ty as ::error_code::OpaqueCodeError>::unused_components(
                                        rest.into_iter()
                                            .map(::std::borrow::ToOwned::to_owned)
                                            .collect(),
                                    ),
                                )
                            }
                        }
                    };
                }
                Child::Unnamed => quote! { Self::#ident(child) },
                Child::Named(field) => quote! { Self::#ident { #field: child } },
            };
            let case_name = ident.to_string();
            let fetch = if plan.child_decode == Outcome::Manual {
                quote! { Self::child_error_code(&rest)? }
            } else {
                quote! {
                    ::error_code::child_error_code::<_, #err_ty>(#case_name, &rest, #delimiter)?
                }
            };
            quote! {
                if first == #table::#konst {
                    let child = #fetch;
                    ::std::result::Result::Ok(#construct)
                }
            }
        })
        .collect();

    let Some((head, tail)) = arms.split_first() else {
        return TokenStream::new();
    };
    quote! {
        if code.is_empty() {
            return ::std::result::Result::Err(#empty);
        }
        let mut components = code.split(#delimiter);
        let first = components.next().unwrap_or_default();
        let rest: ::std::vec::Vec<&str> = components.collect();
        #head
        #(else #tail)*
        else {
            ::std::result::Result::Err(#unrecognized)
        }
    }
}

fn same_final_segment(a: &TokenStream, b: &TokenStream) -> bool {
    let last = |tokens: &TokenStream| {
        tokens
            .to_string()
            .rsplit("::")
            .next()
            .map(|s| s.trim().to_owned())
            .unwrap_or_default()
    };
    last(a) == last(b)
}
