//! Compile-time tests for the `#[hookable]` macro.
//!
//! Uses `trybuild` to verify that supported impl blocks expand to code that
//! compiles and runs.

#[test]
fn compile_pass() {
    let t = trybuild::TestCases::new();
    t.pass("tests/compile_pass/*.rs");
}
