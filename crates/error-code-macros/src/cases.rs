//! Case extraction: turning the subject declaration into a normalized case
//! model.
//!
//! Two input modes produce the same model. Declaration mode walks an enum's
//! variants in source order. External-list mode, for types whose declaration
//! cannot be annotated, reads an explicitly authored `ERROR_CODE_CASES` list
//! of case references.

use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Expr, Fields, Item, ItemEnum};

use crate::diagnostics::{Diagnostics, FixIt};

/// Name of the required case list in external-list mode.
pub const CASE_LIST_IDENT: &str = "ERROR_CODE_CASES";

/// Whether a case carries a nested error-code payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    None,
    Unnamed,
    Named(syn::Ident),
}

/// How the variant was declared. Empty parentheses or braces still carry no
/// payload, but their patterns and constructors need the matching tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Unit,
    Tuple,
    Struct,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub ident: syn::Ident,
    pub child: Child,
    pub shape: Shape,
}

impl Case {
    pub fn span(&self) -> Span {
        self.ident.span()
    }

    /// Hash seed for this case. Field names never enter the seed, so a
    /// payload can be renamed without changing the code.
    pub fn seed(&self, type_name: &str) -> String {
        format!("{type_name}.{}", self.ident)
    }

    /// SCREAMING_SNAKE_CASE constant name for the per-case table entry.
    pub fn const_ident(&self) -> syn::Ident {
        format_ident!("{}", shouty_snake(&self.ident.to_string()), span = self.ident.span())
    }

    pub fn has_child(&self) -> bool {
        self.child != Child::None
    }

    /// Tokens completing a pattern or constructor for a payload-free case.
    pub fn empty_suffix(&self) -> proc_macro2::TokenStream {
        match self.shape {
            Shape::Unit => quote! {},
            Shape::Tuple => quote! { () },
            Shape::Struct => quote! { {} },
        }
    }
}

fn shouty_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_numeric();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || (chars[i - 1].is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Declaration mode: one case per variant, in source order.
///
/// Duplicate variant names are not rejected here; same-name cases simply
/// generate the same code and surface through collision detection.
pub fn from_enum(item: &ItemEnum, diags: &mut Diagnostics) -> Option<Vec<Case>> {
    let mut failed = false;

    if !item.generics.params.is_empty() {
        diags.error(
            item.generics.span(),
            "generic_enum",
            "error_code does not support enums with generic parameters",
        );
        failed = true;
    }

    let mut cases = Vec::with_capacity(item.variants.len());
    for variant in &item.variants {
        let (child, shape) = match &variant.fields {
            Fields::Unit => (Child::None, Shape::Unit),
            Fields::Unnamed(fields) if fields.unnamed.is_empty() => (Child::None, Shape::Tuple),
            Fields::Named(fields) if fields.named.is_empty() => (Child::None, Shape::Struct),
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                (Child::Unnamed, Shape::Tuple)
            }
            Fields::Named(fields) if fields.named.len() == 1 => {
                let child = match fields.named.first().and_then(|f| f.ident.clone()) {
                    Some(field) => Child::Named(field),
                    None => Child::Unnamed,
                };
                (child, Shape::Struct)
            }
            fields => {
                diags.error(
                    variant.span(),
                    "invalid_case",
                    format!(
                        "case `{}` has {} associated values; at most one is permitted, and it \
                         must itself be an error-code type",
                        variant.ident,
                        fields.iter().count()
                    ),
                );
                failed = true;
                continue;
            }
        };
        cases.push(Case {
            ident: variant.ident.clone(),
            child,
            shape,
        });
    }

    if failed {
        None
    } else {
        Some(cases)
    }
}

/// External-list mode: read the `ERROR_CODE_CASES` declaration.
///
/// Every element must be a simple path to a case: there is no syntactic way
/// to name a child pattern without invoking the case, so payload-carrying
/// cases are categorically rejected in this mode.
pub fn from_case_list(
    items: &[Item],
    extend: &syn::Path,
    diags: &mut Diagnostics,
) -> Option<Vec<Case>> {
    let type_name = extend
        .segments
        .last()
        .map(|s| s.ident.to_string())
        .unwrap_or_default();

    let Some(list) = items.iter().find_map(|item| match item {
        Item::Const(c) if c.ident == CASE_LIST_IDENT => Some(c),
        _ => None,
    }) else {
        diags.error_with_fixits(
            extend.span(),
            "missing_case_list",
            format!(
                "external-list mode requires a `{CASE_LIST_IDENT}` declaration listing every \
                 case of `{type_name}`"
            ),
            vec![FixIt {
                description: "add the case list to the module".into(),
                replacement: format!(
                    "const {CASE_LIST_IDENT}: &[{type_name}] = &[\n    \
                     // {type_name}::SomeCase,\n];"
                ),
            }],
        );
        return None;
    };

    let mut failed = false;

    if !matches!(list.vis, syn::Visibility::Inherited) {
        diags.error(
            list.vis.span(),
            "case_list_visibility",
            format!("`{CASE_LIST_IDENT}` must be private to the module"),
        );
        failed = true;
    }

    let elements = match list.expr.as_ref() {
        Expr::Reference(reference) => match reference.expr.as_ref() {
            Expr::Array(array) => &array.elems,
            _ => {
                diags.error(
                    list.expr.span(),
                    "case_list_malformed",
                    format!("`{CASE_LIST_IDENT}` must be initialized with a literal slice of case references"),
                );
                return None;
            }
        },
        Expr::Array(array) => &array.elems,
        _ => {
            diags.error(
                list.expr.span(),
                "case_list_malformed",
                format!("`{CASE_LIST_IDENT}` must be initialized with a literal slice of case references"),
            );
            return None;
        }
    };

    let mut cases = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            Expr::Path(expr) => {
                let Some(segment) = expr.path.segments.last() else {
                    diags.error(element.span(), "case_list_malformed", "empty case reference");
                    failed = true;
                    continue;
                };
                cases.push(Case {
                    ident: segment.ident.clone(),
                    child: Child::None,
                    shape: Shape::Unit,
                });
            }
            Expr::Call(_) | Expr::Struct(_) => {
                diags.error(
                    element.span(),
                    "case_list_payload",
                    "cases with associated values cannot be listed in external-list mode; \
                     annotate the declaring enum instead",
                );
                failed = true;
            }
            other => {
                diags.error(
                    other.span(),
                    "case_list_malformed",
                    format!("`{CASE_LIST_IDENT}` entries must be simple case references like `{type_name}::SomeCase`"),
                );
                failed = true;
            }
        }
    }

    if failed {
        None
    } else {
        Some(cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_enum(source: &str) -> ItemEnum {
        syn::parse_str(source).expect("parse enum")
    }

    fn parse_items(source: &str) -> Vec<Item> {
        let module: syn::ItemMod = syn::parse_str(source).expect("parse mod");
        module.content.expect("inline module").1
    }

    #[test]
    fn classifies_children() {
        let item = parse_enum(
            "enum PaymentError { Declined, Gateway(GatewayError), Processor { source: ProcError } }",
        );
        let mut diags = Diagnostics::new();
        let cases = from_enum(&item, &mut diags).expect("cases");
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].child, Child::None);
        assert_eq!(cases[1].child, Child::Unnamed);
        match &cases[2].child {
            Child::Named(field) => assert_eq!(field, "source"),
            other => panic!("expected named child, got {other:?}"),
        }
        assert!(diags.items().is_empty());
    }

    #[test]
    fn seeds_use_simple_case_names_only() {
        let item = parse_enum("enum PaymentError { Processor { source: ProcError } }");
        let mut diags = Diagnostics::new();
        let cases = from_enum(&item, &mut diags).expect("cases");
        assert_eq!(cases[0].seed("PaymentError"), "PaymentError.Processor");
    }

    #[test]
    fn empty_payload_shapes_are_payload_free() {
        let item = parse_enum("enum E { Flat, Parens(), Braces {} }");
        let mut diags = Diagnostics::new();
        let cases = from_enum(&item, &mut diags).expect("cases");
        assert!(cases.iter().all(|c| c.child == Child::None));
        assert_eq!(cases[0].shape, Shape::Unit);
        assert_eq!(cases[1].shape, Shape::Tuple);
        assert_eq!(cases[2].shape, Shape::Struct);
        assert!(diags.items().is_empty());
    }

    #[test]
    fn empty_suffix_matches_the_declared_shape() {
        let item = parse_enum("enum E { Flat, Parens(), Braces {} }");
        let mut diags = Diagnostics::new();
        let cases = from_enum(&item, &mut diags).expect("cases");
        assert!(cases[0].empty_suffix().is_empty());
        assert_eq!(cases[1].empty_suffix().to_string().replace(' ', ""), "()");
        assert_eq!(cases[2].empty_suffix().to_string().replace(' ', ""), "{}");
    }

    #[test]
    fn multiple_payload_values_are_rejected() {
        let item = parse_enum("enum Bad { Pair(A, B), Ok }");
        let mut diags = Diagnostics::new();
        assert!(from_enum(&item, &mut diags).is_none());
        assert!(diags.has_errors());
        assert_eq!(diags.codes(), vec!["invalid_case"]);
        assert!(diags.items()[0].message.contains("`Pair`"));
    }

    #[test]
    fn generic_enums_are_rejected() {
        let item = parse_enum("enum Bad<T> { Value(T) }");
        let mut diags = Diagnostics::new();
        assert!(from_enum(&item, &mut diags).is_none());
        assert_eq!(diags.codes()[0], "generic_enum");
    }

    #[test]
    fn const_idents_are_screaming_snake() {
        let item = parse_enum("enum E { value1, CardDeclined, HTTPTimeout }");
        let mut diags = Diagnostics::new();
        let cases = from_enum(&item, &mut diags).expect("cases");
        assert_eq!(cases[0].const_ident(), "VALUE1");
        assert_eq!(cases[1].const_ident(), "CARD_DECLINED");
        assert_eq!(cases[2].const_ident(), "HTTP_TIMEOUT");
    }

    fn vendor_path() -> syn::Path {
        syn::parse_str("crate::vendor::VendorError").expect("path")
    }

    #[test]
    fn case_list_is_extracted() {
        let items = parse_items(
            "mod codes { const ERROR_CODE_CASES: &[VendorError] = \
             &[VendorError::Timeout, VendorError::Refused]; }",
        );
        let mut diags = Diagnostics::new();
        let cases = from_case_list(&items, &vendor_path(), &mut diags).expect("cases");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].ident, "Timeout");
        assert_eq!(cases[1].ident, "Refused");
        assert!(cases.iter().all(|c| c.child == Child::None));
    }

    #[test]
    fn missing_case_list_is_a_hard_error_with_fixit() {
        let items = parse_items("mod codes {}");
        let mut diags = Diagnostics::new();
        assert!(from_case_list(&items, &vendor_path(), &mut diags).is_none());
        assert_eq!(diags.codes(), vec!["missing_case_list"]);
        let fixit = &diags.items()[0].fixits[0];
        assert!(fixit.replacement.contains("const ERROR_CODE_CASES: &[VendorError]"));
    }

    #[test]
    fn public_case_list_is_rejected() {
        let items = parse_items(
            "mod codes { pub const ERROR_CODE_CASES: &[VendorError] = &[VendorError::Timeout]; }",
        );
        let mut diags = Diagnostics::new();
        assert!(from_case_list(&items, &vendor_path(), &mut diags).is_none());
        assert_eq!(diags.codes(), vec!["case_list_visibility"]);
    }

    #[test]
    fn payload_invocations_are_rejected() {
        let items = parse_items(
            "mod codes { const ERROR_CODE_CASES: &[VendorError] = \
             &[VendorError::Timeout, VendorError::Wrapped(inner)]; }",
        );
        let mut diags = Diagnostics::new();
        assert!(from_case_list(&items, &vendor_path(), &mut diags).is_none());
        assert_eq!(diags.codes(), vec!["case_list_payload"]);
    }

    #[test]
    fn non_array_initializer_is_rejected() {
        let items =
            parse_items("mod codes { const ERROR_CODE_CASES: &[VendorError] = make_cases(); }");
        let mut diags = Diagnostics::new();
        assert!(from_case_list(&items, &vendor_path(), &mut diags).is_none());
        assert_eq!(diags.codes(), vec!["case_list_malformed"]);
    }

    #[test]
    fn duplicate_case_references_are_permitted_here() {
        // Uniqueness is not this module's job; duplicates fall out of
        // collision detection downstream.
        let items = parse_items(
            "mod codes { const ERROR_CODE_CASES: &[VendorError] = \
             &[VendorError::Timeout, VendorError::Timeout]; }",
        );
        let mut diags = Diagnostics::new();
        let cases = from_case_list(&items, &vendor_path(), &mut diags).expect("cases");
        assert_eq!(cases.len(), 2);
        assert!(diags.items().is_empty());
    }
}
