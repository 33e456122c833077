mod common;

use common::{check_run, Expected};

// `continue` re-enters at the condition check (spec §4.3: its target is
// `loopStarts.top()`, pushed at the start of the while's condition). On the
// x == 2 iteration this skips both the write and the trailing `x = x + 1`,
// so x jumps straight from 2 to 3 without being written; only 1 and 3 are
// written before x reaches 4 and the loop exits.
#[test]
fn continue_skips_the_write_on_the_matching_iteration() {
    let source = r#"program {
        int x = 1;
        while (x < 4) {
            if (x == 2) {
                x = x + 1;
                continue;
            }
            write(x);
            x = x + 1;
        }
    }"#;

    check_run(source, "", Expected { stdout: "13" }).unwrap();
}
