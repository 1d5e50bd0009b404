//! Validation of a hand-written code table.
//!
//! The table is a unit struct named `<Type>OpaqueCode` whose inherent
//! `&'static str` constants pin one code per case. Authoring it manually is
//! how codes already shipped to users survive a renamed case or a changed
//! configuration.

use syn::{Expr, Item, Lit};

use super::{impls_for, is_str_ref, Outcome, Subject};
use crate::diagnostics::{Diagnostics, FixIt};

/// Validates a manual table against the expected per-case constants, given
/// as `(const name, generated code)` pairs in case order. The generated
/// codes only feed the missing-entry fix-it.
pub fn validate_table(
    subject: &Subject<'_>,
    expected: &[(syn::Ident, String)],
    diags: &mut Diagnostics,
) -> Outcome {
    let table_ident = subject.table_ident();
    let Some(strukt) = subject.items.iter().find_map(|item| match item {
        Item::Struct(s) if s.ident == table_ident => Some(s),
        _ => None,
    }) else {
        return Outcome::Synthesize;
    };

    if !matches!(strukt.fields, syn::Fields::Unit) {
        diags.error(
            strukt.ident.span(),
            "manual_table_not_unit",
            format!("`{table_ident}` must be a unit struct; it exists only as a namespace for per-case code constants"),
        );
        return Outcome::Manual;
    }

    // (const name, literal value) for every well-formed entry. Malformed
    // entries still count as declared so they are not reported missing too.
    let mut entries: Vec<(&syn::Ident, String)> = Vec::new();
    let mut declared: Vec<&syn::Ident> = Vec::new();
    for block in impls_for(subject.items, &table_ident) {
        for item in &block.items {
            let syn::ImplItem::Const(konst) = item else {
                if let syn::ImplItem::Fn(f) = item {
                    diags.warning(
                        f.sig.ident.span(),
                        "manual_table_unknown",
                        format!(
                            "`{table_ident}::{}` is not a code constant and is never consulted",
                            f.sig.ident
                        ),
                    );
                }
                continue;
            };
            declared.push(&konst.ident);
            if !is_str_ref(&konst.ty) {
                diags.error(
                    konst.ident.span(),
                    "manual_table_entry",
                    format!("`{table_ident}::{}` must have type `&'static str`", konst.ident),
                );
                continue;
            }
            match &konst.expr {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Str(value) => entries.push((&konst.ident, value.value())),
                    _ => {
                        diags.error(
                            konst.ident.span(),
                            "manual_table_entry",
                            format!(
                                "`{table_ident}::{}` must be initialized with a string literal",
                                konst.ident
                            ),
                        );
                    }
                },
                _ => {
                    diags.error(
                        konst.ident.span(),
                        "manual_table_entry",
                        format!(
                            "`{table_ident}::{}` must be initialized with a string literal so \
                             its value can be checked for uniqueness",
                            konst.ident
                        ),
                    );
                }
            }
        }
    }

    for (ident, _) in &entries {
        if !expected.iter().any(|(name, _)| name == *ident) {
            diags.warning(
                ident.span(),
                "manual_table_unknown",
                format!(
                    "`{table_ident}::{ident}` does not correspond to any case of `{}` and is \
                     never consulted",
                    subject.ident
                ),
            );
        }
    }

    let missing: Vec<&(syn::Ident, String)> = expected
        .iter()
        .filter(|(name, _)| !declared.iter().any(|ident| *ident == name))
        .collect();
    if !missing.is_empty() {
        let names = missing
            .iter()
            .map(|(name, _)| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(", ");
        let replacement = missing
            .iter()
            .map(|(name, code)| format!("    pub const {name}: &'static str = \"{code}\";"))
            .collect::<Vec<_>>()
            .join("\n");
        diags.error_with_fixits(
            strukt.ident.span(),
            "manual_table_missing",
            format!("`{table_ident}` is missing entries for {names}; a partial table would change those cases' codes silently"),
            vec![FixIt {
                description: format!("add the missing entries to `impl {table_ident}`"),
                replacement,
            }],
        );
    }

    // Two cases decoding from the same string is as fatal manually as it is
    // generated.
    let mut reported: Vec<&str> = Vec::new();
    for (i, (ident, value)) in entries.iter().enumerate() {
        if reported.contains(&value.as_str()) {
            continue;
        }
        let duplicates: Vec<&syn::Ident> = entries[i + 1..]
            .iter()
            .filter(|(_, other)| other == value)
            .map(|(other_ident, _)| *other_ident)
            .collect();
        if !duplicates.is_empty() {
            reported.push(value);
            let mut all = vec![format!("`{ident}`")];
            all.extend(duplicates.iter().map(|d| format!("`{d}`")));
            diags.error(
                ident.span(),
                "manual_table_duplicate",
                format!(
                    "code \"{value}\" is assigned to multiple entries of `{table_ident}`: {}",
                    all.join(", ")
                ),
            );
        }
    }

    Outcome::Manual
}
