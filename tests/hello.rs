mod common;

use common::{check_run, Expected};

#[test]
fn writes_a_string_literal() {
    check_run(
        r#"program { write("Hello world!"); }"#,
        "",
        Expected { stdout: "Hello world!" },
    )
    .unwrap();
}
