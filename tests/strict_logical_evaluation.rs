//! `and`/`or` are strict, not short-circuiting: both operands are always
//! evaluated, since the parser emits both expression node events before the
//! operator itself. Each operand is an assignment here so we can observe
//! whether it actually ran.

mod common;

use common::{check_run, Expected};

#[test]
fn or_evaluates_its_right_operand_even_though_the_left_is_true() {
    let source = r#"program {
        boolean a = true;
        boolean b = false;
        boolean r;
        r = (a = true) or (b = true);
        write(a, b, r);
    }"#;

    check_run(source, "", Expected { stdout: "truetruetrue" }).unwrap();
}

#[test]
fn and_evaluates_its_right_operand_even_though_the_left_is_false() {
    let source = r#"program {
        boolean a = false;
        boolean b = false;
        boolean r;
        r = (a = false) and (b = true);
        write(a, b, r);
    }"#;

    check_run(source, "", Expected { stdout: "falsetruefalse" }).unwrap();
}
