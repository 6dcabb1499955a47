use crate::frontend::Capture;
use crate::interpreter::{RunResult, Runner};

mod programs;

/// Runs `source` on a fresh runner with the built-in prelude.
fn run(source: &str) -> (RunResult, Capture) {
    let capture = Capture::new();
    let mut runner = Runner::new(capture.frontend()).expect("built-in prelude loads");
    let result = runner.run(source);
    (result, capture)
}

fn output_of(source: &str) -> String {
    let (result, capture) = run(source);
    assert_eq!(result.error, "", "{source}");
    capture.output()
}
