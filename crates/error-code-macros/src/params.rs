//! Resolution of `#[error_code(...)]` attribute arguments.
//!
//! Three structurally identical resolvers extract one optional literal each
//! (`code_length`, `delimiter`, `code_characters`), falling back to the
//! built-in default with a warning on malformed input. The resolvers are
//! independent and order-independent: a malformed `delimiter` never blocks
//! `code_length` from resolving. Configuration problems are always soft:
//! they warn and substitute the default, never block generation.

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, ExprLit, Lit, Meta, Token};

use crate::diagnostics::Diagnostics;
use crate::generate::{default_alphabet, DEFAULT_CODE_LENGTH, DEFAULT_DELIMITER, MIN_ALPHABET_LEN};

/// A resolved setting plus whether the user explicitly provided it.
///
/// The flag matters downstream: a delimiter is only worth a "never used"
/// warning when the user actually asked for one.
#[derive(Debug, Clone)]
pub struct Setting<T> {
    pub value: T,
    pub is_manual: bool,
    pub span: Span,
}

impl<T> Setting<T> {
    fn fallback(value: T) -> Self {
        Self {
            value,
            is_manual: false,
            span: Span::call_site(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub code_length: Setting<usize>,
    pub delimiter: Setting<String>,
    pub alphabet: Setting<Vec<char>>,
    /// External-list mode: the already-declared type to implement for.
    pub extend: Option<syn::Path>,
}

pub fn resolve(args: &Punctuated<Meta, Token![,]>, diags: &mut Diagnostics) -> Config {
    let mut extend = None;

    for meta in args {
        let Some(ident) = meta.path().get_ident().map(ToString::to_string) else {
            diags.error(meta.span(), "unknown_argument", "unrecognized argument");
            continue;
        };
        match ident.as_str() {
            // Values are handled by the dedicated resolvers below; only the
            // `key = value` shape is checked here, since a bare or listed
            // keyword never reaches a resolver.
            "code_length" | "delimiter" | "code_characters" => {
                if !matches!(meta, Meta::NameValue(_)) {
                    let code = match ident.as_str() {
                        "code_length" => "invalid_code_length",
                        "delimiter" => "invalid_delimiter",
                        _ => "invalid_code_characters",
                    };
                    diags.warning(
                        meta.span(),
                        code,
                        format!("`{ident}` must be written as `{ident} = value`; using the default"),
                    );
                }
            }
            "extend" => match meta {
                Meta::NameValue(nv) => match &nv.value {
                    Expr::Path(expr) => extend = Some(expr.path.clone()),
                    other => diags.error(
                        other.span(),
                        "invalid_extend",
                        "`extend` must be a path to the error-code type, e.g. `extend = crate::VendorError`",
                    ),
                },
                other => diags.error(
                    other.span(),
                    "invalid_extend",
                    "`extend` must be written as `extend = path::To::Type`",
                ),
            },
            other => diags.error(
                meta.path().span(),
                "unknown_argument",
                format!("unknown argument `{other}`"),
            ),
        }
    }

    Config {
        code_length: resolve_code_length(args, diags),
        delimiter: resolve_delimiter(args, diags),
        alphabet: resolve_alphabet(args, diags),
        extend,
    }
}

fn find_value<'a>(args: &'a Punctuated<Meta, Token![,]>, keyword: &str) -> Option<&'a Expr> {
    args.iter().find_map(|meta| match meta {
        Meta::NameValue(nv) if nv.path.is_ident(keyword) => Some(&nv.value),
        _ => None,
    })
}

fn resolve_code_length(args: &Punctuated<Meta, Token![,]>, diags: &mut Diagnostics) -> Setting<usize> {
    let Some(value) = find_value(args, "code_length") else {
        return Setting::fallback(DEFAULT_CODE_LENGTH);
    };
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => match lit.base10_parse::<usize>() {
            Ok(0) => {
                diags.warning(
                    lit.span(),
                    "code_length_coerced",
                    "`code_length` must be at least 1; a length of 0 was coerced to 1",
                );
                Setting {
                    value: 1,
                    is_manual: true,
                    span: lit.span(),
                }
            }
            Ok(length) => Setting {
                value: length,
                is_manual: true,
                span: lit.span(),
            },
            Err(_) => {
                diags.warning(
                    lit.span(),
                    "invalid_code_length",
                    format!("`code_length` is out of range; using default {DEFAULT_CODE_LENGTH}"),
                );
                Setting::fallback(DEFAULT_CODE_LENGTH)
            }
        },
        other => {
            diags.warning(
                other.span(),
                "invalid_code_length",
                format!(
                    "`code_length` must be a positive integer literal; using default {DEFAULT_CODE_LENGTH}"
                ),
            );
            Setting::fallback(DEFAULT_CODE_LENGTH)
        }
    }
}

fn resolve_delimiter(args: &Punctuated<Meta, Token![,]>, diags: &mut Diagnostics) -> Setting<String> {
    let Some(value) = find_value(args, "delimiter") else {
        return Setting::fallback(DEFAULT_DELIMITER.to_owned());
    };
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => {
            let delimiter = lit.value();
            if delimiter.is_empty() {
                diags.warning(
                    lit.span(),
                    "invalid_delimiter",
                    format!("`delimiter` must not be empty; using default \"{DEFAULT_DELIMITER}\""),
                );
                return Setting::fallback(DEFAULT_DELIMITER.to_owned());
            }
            Setting {
                value: delimiter,
                is_manual: true,
                span: lit.span(),
            }
        }
        other => {
            diags.warning(
                other.span(),
                "invalid_delimiter",
                format!(
                    "`delimiter` must be a non-empty string literal; using default \"{DEFAULT_DELIMITER}\""
                ),
            );
            Setting::fallback(DEFAULT_DELIMITER.to_owned())
        }
    }
}

fn resolve_alphabet(args: &Punctuated<Meta, Token![,]>, diags: &mut Diagnostics) -> Setting<Vec<char>> {
    let Some(value) = find_value(args, "code_characters") else {
        return Setting::fallback(default_alphabet());
    };
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => {
            let mut alphabet: Vec<char> = lit.value().chars().collect();
            alphabet.sort_unstable();
            alphabet.dedup();
            if alphabet.len() < MIN_ALPHABET_LEN {
                diags.warning(
                    lit.span(),
                    "invalid_code_characters",
                    format!(
                        "`code_characters` must contain at least {MIN_ALPHABET_LEN} unique characters; \
                         using the default 62-character alphanumeric set"
                    ),
                );
                return Setting::fallback(default_alphabet());
            }
            Setting {
                value: alphabet,
                is_manual: true,
                span: lit.span(),
            }
        }
        other => {
            diags.warning(
                other.span(),
                "invalid_code_characters",
                "`code_characters` must be a string literal; using the default 62-character alphanumeric set",
            );
            Setting::fallback(default_alphabet())
        }
    }
}

/// Checks that belong to the caller, not the resolvers: they need the full
/// configuration and the extracted cases.
pub fn post_checks(config: &mut Config, any_case_has_child: bool, diags: &mut Diagnostics) {
    if config.delimiter.is_manual && !any_case_has_child {
        diags.warning(
            config.delimiter.span,
            "delimiter_unused",
            "`delimiter` has no effect because no case carries a nested error code",
        );
    }

    // A delimiter character that can also appear inside a generated code
    // makes decoding ambiguous, so an overlapping custom delimiter is
    // rejected at resolution time.
    let overlaps = |delimiter: &str, alphabet: &[char]| {
        delimiter.chars().any(|c| alphabet.contains(&c))
    };
    if config.delimiter.is_manual && overlaps(&config.delimiter.value, &config.alphabet.value) {
        diags.warning(
            config.delimiter.span,
            "delimiter_overlap",
            format!(
                "`delimiter` \"{}\" contains characters drawn from the code alphabet, which makes \
                 decoding ambiguous; using default \"{DEFAULT_DELIMITER}\"",
                config.delimiter.value
            ),
        );
        config.delimiter = Setting::fallback(DEFAULT_DELIMITER.to_owned());
    }
    if !config.delimiter.is_manual && overlaps(&config.delimiter.value, &config.alphabet.value) {
        // The custom alphabet swallowed the default delimiter; nothing safe
        // is left to fall back to, so flag it and proceed.
        diags.warning(
            config.alphabet.span,
            "delimiter_overlap",
            format!(
                "the code alphabet contains the delimiter \"{}\"; nested codes may not decode \
                 unambiguously",
                config.delimiter.value
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse::Parser;

    fn parse_args(source: &str) -> Punctuated<Meta, Token![,]> {
        Punctuated::<Meta, Token![,]>::parse_terminated
            .parse_str(source)
            .expect("parse args")
    }

    fn resolve_str(source: &str) -> (Config, Diagnostics) {
        let args = parse_args(source);
        let mut diags = Diagnostics::new();
        let config = resolve(&args, &mut diags);
        (config, diags)
    }

    #[test]
    fn absent_arguments_resolve_silently_to_defaults() {
        let (config, diags) = resolve_str("");
        assert_eq!(config.code_length.value, 4);
        assert!(!config.code_length.is_manual);
        assert_eq!(config.delimiter.value, "-");
        assert!(!config.delimiter.is_manual);
        assert_eq!(config.alphabet.value.len(), 62);
        assert!(diags.items().is_empty());
    }

    #[test]
    fn explicit_values_are_marked_manual() {
        let (config, diags) =
            resolve_str(r#"code_length = 6, delimiter = "_", code_characters = "ABCDE""#);
        assert_eq!(config.code_length.value, 6);
        assert!(config.code_length.is_manual);
        assert_eq!(config.delimiter.value, "_");
        assert_eq!(config.alphabet.value, vec!['A', 'B', 'C', 'D', 'E']);
        assert!(diags.items().is_empty());
    }

    #[test]
    fn code_length_zero_is_coerced_to_one() {
        let (config, diags) = resolve_str("code_length = 0");
        assert_eq!(config.code_length.value, 1);
        assert!(config.code_length.is_manual);
        assert_eq!(diags.codes(), vec!["code_length_coerced"]);
        assert!(!diags.has_errors());
    }

    #[test]
    fn code_length_expression_falls_back_with_warning() {
        let (config, diags) = resolve_str("code_length = 4 + 4");
        assert_eq!(config.code_length.value, 4);
        assert!(!config.code_length.is_manual);
        assert_eq!(diags.codes(), vec!["invalid_code_length"]);
        assert!(!diags.has_errors());
    }

    #[test]
    fn empty_delimiter_falls_back_with_warning() {
        let (config, diags) = resolve_str(r#"delimiter = """#);
        assert_eq!(config.delimiter.value, "-");
        assert!(!config.delimiter.is_manual);
        assert_eq!(diags.codes(), vec!["invalid_delimiter"]);
    }

    #[test]
    fn non_literal_delimiter_falls_back_with_warning() {
        let (config, diags) = resolve_str("delimiter = 7");
        assert_eq!(config.delimiter.value, "-");
        assert_eq!(diags.codes(), vec!["invalid_delimiter"]);
    }

    #[test]
    fn alphabet_with_too_few_unique_characters_falls_back() {
        let (config, diags) = resolve_str(r#"code_characters = "1111111111""#);
        assert_eq!(config.alphabet.value.len(), 62);
        assert!(!config.alphabet.is_manual);
        assert_eq!(diags.codes(), vec!["invalid_code_characters"]);
    }

    #[test]
    fn alphabet_is_deduplicated_and_sorted() {
        let (config, _) = resolve_str(r#"code_characters = "edcbaa""#);
        assert_eq!(config.alphabet.value, vec!['a', 'b', 'c', 'd', 'e']);
    }

    #[test]
    fn one_failure_does_not_block_the_others() {
        let (config, diags) = resolve_str(r#"code_length = 4 + 4, delimiter = "_""#);
        assert_eq!(config.code_length.value, 4);
        assert_eq!(config.delimiter.value, "_");
        assert!(config.delimiter.is_manual);
        assert_eq!(diags.codes(), vec!["invalid_code_length"]);
    }

    #[test]
    fn unknown_argument_is_a_hard_error() {
        let (_, diags) = resolve_str("code_lenght = 4");
        assert!(diags.has_errors());
        assert_eq!(diags.codes(), vec!["unknown_argument"]);
    }

    #[test]
    fn extend_path_is_captured() {
        let (config, diags) = resolve_str("extend = crate::vendor::VendorError");
        let path = config.extend.expect("extend path");
        assert_eq!(path.segments.last().unwrap().ident, "VendorError");
        assert!(diags.items().is_empty());
    }

    #[test]
    fn extend_non_path_is_a_hard_error() {
        let (_, diags) = resolve_str(r#"extend = "VendorError""#);
        assert!(diags.has_errors());
        assert_eq!(diags.codes(), vec!["invalid_extend"]);
    }

    #[test]
    fn unused_delimiter_warns_only_when_manual() {
        let (mut config, mut diags) = resolve_str(r#"delimiter = "_""#);
        post_checks(&mut config, false, &mut diags);
        assert_eq!(diags.codes(), vec!["delimiter_unused"]);

        let (mut config, mut diags) = resolve_str("");
        post_checks(&mut config, false, &mut diags);
        assert!(diags.items().is_empty());
    }

    #[test]
    fn overlapping_custom_delimiter_falls_back() {
        let (mut config, mut diags) = resolve_str(r#"delimiter = "a""#);
        post_checks(&mut config, true, &mut diags);
        assert_eq!(diags.codes(), vec!["delimiter_overlap"]);
        assert_eq!(config.delimiter.value, "-");
        assert!(!config.delimiter.is_manual);
    }

    #[test]
    fn alphabet_containing_default_delimiter_warns_but_proceeds() {
        let (mut config, mut diags) = resolve_str(r#"code_characters = "-abcd""#);
        post_checks(&mut config, true, &mut diags);
        assert_eq!(diags.codes(), vec!["delimiter_overlap"]);
        assert_eq!(config.delimiter.value, "-");
    }
}
