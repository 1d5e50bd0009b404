//! Builds the trybuild fixtures as full programs: expansion output must
//! compile cleanly and the assertions in each `main` must hold.

#[test]
fn macro_expansion_compiles() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/*.rs");
}
