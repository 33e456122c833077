//! Reads two ints, mixes arithmetic, string concatenation, and a
//! write-of-an-assignment in one statement.

mod common;

use common::{check_run, Expected};

#[test]
fn reads_two_values_and_mixes_concatenation_and_assignment() {
    let source = r#"program {
        int x, y;
        read(x);
        read(y);
        write(x + y, "123", "456" + "00", "\n");
        x = 20;
        write(x, x = 10);
    }"#;

    check_run(
        source,
        "1 2",
        Expected {
            stdout: "312345600\n2010",
        },
    )
    .unwrap();
}
