//! Macro expansion exercised through the public API: generated codes,
//! nested composition and the decode failure taxonomy.

use error_code::{error_code, DecodeError, ErrorCode};

#[error_code]
#[derive(Debug, PartialEq)]
#[allow(non_camel_case_types)]
enum TestCode {
    value1,
    value2,
}

#[error_code]
#[derive(Debug, PartialEq)]
enum GatewayError {
    Timeout,
    Refused,
}

#[error_code]
#[derive(Debug, PartialEq)]
enum ProcError {
    Crash,
}

#[error_code]
#[derive(Debug, PartialEq)]
enum PaymentError {
    Declined,
    Gateway(GatewayError),
    Processor { source: ProcError },
}

#[error_code]
#[derive(Debug, PartialEq)]
enum InnerError {
    Deep,
}

#[error_code]
#[derive(Debug, PartialEq)]
enum MiddleError {
    Leaf(InnerError),
    Plain,
}

#[error_code]
#[derive(Debug, PartialEq)]
enum OuterError {
    Inner(MiddleError),
}

#[test]
fn codes_are_deterministic_and_stable() {
    assert_eq!(TestCode::value1.opaque_code(), "DGj4");
    assert_eq!(TestCode::value2.opaque_code(), "of8f");
    assert_eq!(TestCode::value1.opaque_code(), TestCode::value1.opaque_code());
}

#[test]
fn table_constants_are_exposed() {
    assert_eq!(TestCodeOpaqueCode::VALUE1, "DGj4");
    assert_eq!(TestCodeOpaqueCode::VALUE2, "of8f");
}

#[test]
fn leaf_codes_round_trip() {
    assert_eq!(TestCode::from_opaque_code("DGj4").unwrap(), TestCode::value1);
    assert_eq!(TestCode::from_opaque_code("of8f").unwrap(), TestCode::value2);
}

#[test]
fn empty_code_is_rejected() {
    assert!(matches!(
        TestCode::from_opaque_code(""),
        Err(DecodeError::EmptyCode)
    ));
}

#[test]
fn unknown_code_is_rejected_with_the_input() {
    match TestCode::from_opaque_code("zzzz") {
        Err(DecodeError::UnrecognizedCode(code)) => assert_eq!(code, "zzzz"),
        other => panic!("expected UnrecognizedCode, got {other:?}"),
    }
}

#[test]
fn trailing_components_on_a_leaf_are_rejected() {
    match TestCode::from_opaque_code("DGj4-extra") {
        Err(DecodeError::UnusedComponents(components)) => {
            assert_eq!(components, vec!["extra".to_owned()]);
        }
        other => panic!("expected UnusedComponents, got {other:?}"),
    }
}

#[test]
fn nested_case_appends_the_child_code() {
    assert_eq!(PaymentError::Declined.opaque_code(), "G3uP");
    assert_eq!(
        PaymentError::Gateway(GatewayError::Timeout).opaque_code(),
        "Q1od-NYHA"
    );
    assert_eq!(
        PaymentError::Processor {
            source: ProcError::Crash
        }
        .opaque_code(),
        "ArOd-zSLs"
    );
}

#[test]
fn nested_codes_round_trip() {
    let original = PaymentError::Gateway(GatewayError::Refused);
    let code = original.opaque_code();
    assert_eq!(code, "Q1od-u5kh");
    assert_eq!(PaymentError::from_opaque_code(&code).unwrap(), original);

    let named = PaymentError::Processor {
        source: ProcError::Crash,
    };
    assert_eq!(
        PaymentError::from_opaque_code(&named.opaque_code()).unwrap(),
        named
    );
}

#[test]
fn child_decode_failures_name_the_case() {
    match PaymentError::from_opaque_code("Q1od-####") {
        Err(DecodeError::ChildDecode { case, source }) => {
            assert_eq!(case, "Gateway");
            assert!(source.to_string().contains("####"));
        }
        other => panic!("expected ChildDecode, got {other:?}"),
    }
}

#[test]
fn three_levels_compose_and_round_trip() {
    let deep = OuterError::Inner(MiddleError::Leaf(InnerError::Deep));
    let code = deep.opaque_code();
    assert_eq!(code, "N0dG-L2Pm-0TKr");
    assert_eq!(OuterError::from_opaque_code(&code).unwrap(), deep);

    let shallow = OuterError::Inner(MiddleError::Plain);
    assert_eq!(shallow.opaque_code(), "N0dG-94Hm");
    assert_eq!(
        OuterError::from_opaque_code("N0dG-94Hm").unwrap(),
        shallow
    );
}

#[error_code]
#[derive(Debug, PartialEq)]
enum ShapeError {
    Flat,
    Parens(),
    Braces {},
}

#[test]
fn empty_payload_variants_behave_as_leaves() {
    for value in [ShapeError::Flat, ShapeError::Parens(), ShapeError::Braces {}] {
        let code = value.opaque_code();
        assert!(!code.contains('-'));
        assert_eq!(ShapeError::from_opaque_code(&code).unwrap(), value);
    }
}

#[test]
fn renaming_a_payload_field_does_not_change_the_code() {
    // The seed is built from the type and case names only; `source` never
    // enters the hash, so this matches the tuple-payload derivation.
    assert_eq!(
        PaymentError::Processor {
            source: ProcError::Crash
        }
        .opaque_code()
        .split('-')
        .next(),
        Some("ArOd")
    );
}

mod configured {
    use super::*;

    #[error_code(code_length = 2)]
    #[derive(Debug, PartialEq)]
    pub(crate) enum BillingError {
        Overdue,
        Suspended,
    }

    #[error_code(code_characters = "ABCDE")]
    #[derive(Debug, PartialEq)]
    pub(crate) enum AlphaCode {
        First,
        Second,
    }

    #[error_code(code_length = 3)]
    #[derive(Debug, PartialEq)]
    pub(crate) enum LeafCode {
        End,
    }

    #[error_code(code_length = 3, delimiter = "::")]
    #[derive(Debug, PartialEq)]
    pub(crate) enum MidCode {
        Wrap(LeafCode),
    }

    #[test]
    fn code_length_controls_segment_width() {
        assert_eq!(BillingError::Overdue.opaque_code(), "XI");
        assert_eq!(BillingError::Suspended.opaque_code(), "Yh");
        assert_eq!(
            BillingError::from_opaque_code("XI").unwrap(),
            BillingError::Overdue
        );
    }

    #[test]
    fn custom_alphabet_bounds_the_character_set() {
        assert_eq!(AlphaCode::First.opaque_code(), "CABD");
        assert_eq!(AlphaCode::Second.opaque_code(), "BBBA");
        assert!(AlphaCode::First
            .opaque_code()
            .chars()
            .all(|c| "ABCDE".contains(c)));
    }

    #[test]
    fn custom_delimiter_separates_nested_segments() {
        let wrapped = MidCode::Wrap(LeafCode::End);
        assert_eq!(wrapped.opaque_code(), "iXU::hKv");
        assert_eq!(MidCode::from_opaque_code("iXU::hKv").unwrap(), wrapped);
    }
}
