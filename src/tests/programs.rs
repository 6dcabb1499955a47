use super::{output_of, run};
use crate::config::InterpreterConfig;
use crate::frontend::Frontend;
use crate::interpreter::{Outcome, Runner, PRELUDE};
use crate::language::parser::MAX_BLOCK_DEPTH;
use crate::runtime::value::Value;
use pretty_assertions::assert_eq;

#[test]
fn hello_world() {
    let (result, capture) = run("Print \"hello world\";");
    assert_eq!(capture.output(), "hello world\n");
    assert_eq!(capture.error_text(), "");
    assert_eq!(result.outcome, Outcome::Completed);
}

#[test]
fn operands_follow_the_written_order() {
    let (result, _) = run("- 1 2");
    assert_eq!(result.stack, vec![Value::Number(1.0)]);
    let (result, _) = run("/ 2 10");
    assert_eq!(result.stack, vec![Value::Number(5.0)]);
    assert_eq!(output_of("Print - 10 Modulo 3 10;"), "-9\n");
}

#[test]
fn shadowing_in_one_block_is_rejected() {
    let (result, capture) = run("Let X 1; Let X 2; Print X;");
    assert_eq!(result.outcome, Outcome::Rejected);
    assert!(result.stack.is_empty());
    assert_eq!(capture.output(), "");
    assert!(
        capture
            .errors()
            .iter()
            .any(|message| message == "Let X: cannot shadow in the same block"),
        "{:?}",
        capture.errors()
    );
}

#[test]
fn shadowing_an_outer_block_is_allowed() {
    assert_eq!(output_of("Let X 1; Def F (Let X 2; X); Print F; Print X;"), "2\n1\n");
}

#[test]
fn early_use_is_not_an_undefined_symbol() {
    let (result, capture) = run("Print X; Let X 1;");
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.error, "X used before declaration");
    assert_eq!(capture.errors(), vec!["X used before declaration".to_string()]);
    assert_eq!(capture.diagnostics().len(), 1);
}

#[test]
fn undefined_symbols_are_all_reported_before_running() {
    let (result, capture) = run("Print 1; Foo; Bar (Baz);");
    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(capture.output(), "");
    assert_eq!(
        capture.errors(),
        vec![
            "undefined symbol Foo".to_string(),
            "undefined symbol Baz".to_string(),
            "undefined symbol Bar".to_string(),
        ]
    );
}

#[test]
fn boxes_alias_and_plain_values_copy() {
    let (result, _) = run("Let A Box 1; Let B A; Set A 2; Unbox B");
    assert_eq!(result.stack, vec![Value::Number(2.0)]);

    let (result, _) = run("Let A 1; Let B A; Def G (Let A 5; A); G; B");
    assert_eq!(result.stack, vec![Value::Number(5.0), Value::Number(1.0)]);
}

#[test]
fn tables_answer_membership() {
    let source = "\
        Let T Insert \\c 3 Insert \\a 1 Insert \\b 2 Table ();\
        Print Has \\a T;\
        Print Has \\a Remove \\a T;\
        Print Length Keys T;\
        Print Length Values Remove \\b T;\
        Print Keys T;\
        Print . \\b T;";
    assert_eq!(output_of(source), "True\nFalse\n3\n2\n(\\a \\b \\c)\n2\n");
}

#[test]
fn table_literals_pair_keys_with_values() {
    assert_eq!(
        output_of("Let T Table (\\a 1 \\b \"x\"); Print T; Print Values T;"),
        "{ \\a:1 \\b:\"x\" }\n(1 \"x\")\n"
    );
    let (result, _) = run("Table (1 2 3)");
    assert_eq!(result.error, "in Table: Table initializer must be key-value pairs");
}

#[test]
fn begin_escapes_return_early_with_the_stack_as_is() {
    let (result, capture) = run("Begin (Let E; Print 1; 7; Do E; Print 2; 8); Print 3;");
    assert_eq!(result.outcome, Outcome::Completed);
    assert_eq!(capture.output(), "1\n3\n");
    assert_eq!(result.stack, vec![Value::Number(7.0)]);
}

#[test]
fn begin_escapes_pass_through_nested_calls() {
    let source = "\
        Def Find (Let Target; Let L; Begin (Let Found; For L (Let X; When == X Target (Do Found)); False));\
        Find 3 List (1 2 3 4)";
    let (result, _) = run(source);
    assert_eq!(result.error, "");
    assert!(result.stack.is_empty(), "{:?}", result.stack);
}

#[test]
fn begin_escape_used_after_return_is_an_error() {
    let (result, capture) = run("Begin ();\nDo;");
    assert_eq!(result.outcome, Outcome::Failed);
    let message = capture.error_text();
    assert!(message.starts_with("in Do:"), "{message}");
    assert!(message.contains("Begin"), "{message}");
}

#[test]
fn nested_begin_escape_used_after_return_is_an_error() {
    let (_, capture) = run("Begin (\n  Begin ();\n  Do;\n);");
    let message = capture.error_text();
    assert!(message.starts_with("in Begin: in Do:"), "{message}");
    assert!(message.ends_with("cannot exit 'Begin' from outside the 'Begin' block"));
}

#[test]
fn runaway_recursion_is_reported() {
    let (result, capture) = run("Def F (F); F;");
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.error.ends_with("call stack overflowed!"), "{}", result.error);
    assert!(result.error.starts_with("in F: in F:"));
    assert_eq!(capture.errors(), vec![result.error.clone()]);
}

#[test]
fn configured_call_stack_limits_apply() {
    let config = InterpreterConfig::default().with_call_stack_limit(500);
    let mut runner = Runner::with_prelude(config, PRELUDE, Frontend::silent()).unwrap();
    let result = runner.run("Def F (F); F;");
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.error.matches("in F: ").count() < 500);
}

#[test]
fn deep_but_bounded_recursion_completes() {
    let source = "Def Fib (Let N; Do If < 2 N (N) (+ Fib - 1 N Fib - 2 N)); Print Fib 20;";
    assert_eq!(output_of(source), "6765\n");
    let source = "Def Count (Let N; When > 0 N (Count - 1 N)); Count 600; Print \"done\";";
    assert_eq!(output_of(source), "done\n");
}

#[test]
fn numbers_within_tolerance_are_equal() {
    assert_eq!(output_of("Print == 0.3 + 0.1 0.2;"), "True\n");
    assert_eq!(output_of("Print == 3 Sqrt 9;"), "True\n");
    assert_eq!(output_of("Print == 1 1.0000001;"), "False\n");
    assert_eq!(output_of("Print != 1 \"1\";"), "True\n");
}

#[test]
fn stop_halts_cleanly_from_any_depth() {
    let (result, capture) = run("Def F (Print 1; Stop; Print 2); F; Print 3;");
    assert_eq!(result.outcome, Outcome::Stopped);
    assert_eq!(result.error, "");
    assert!(result.is_ok());
    assert_eq!(capture.output(), "1\n");
}

#[test]
fn user_errors_abort_the_program() {
    let (result, capture) = run("Print \"a\"; Error \"boom\"; Print \"b\";");
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.error, "boom");
    assert_eq!(capture.output(), "a\n");
    assert_eq!(capture.error_text(), "boom");
}

#[test]
fn errors_collect_context_from_each_boundary() {
    let (result, _) = run("Def Inner (List (Sqrt -1)); Def Outer (Inner); Outer;");
    assert_eq!(
        result.error,
        "in Outer: in Inner: in List: in Sqrt: sqrt of a negative number"
    );
}

#[test]
fn put_and_print_share_a_line() {
    assert_eq!(output_of("Put \"a\"; Put 1; Print True;"), "a1True\n");
}

#[test]
fn stack_snapshots_without_consuming() {
    let (result, capture) = run("1 2; Print Stack;");
    assert_eq!(capture.output(), "(1 2)\n");
    assert_eq!(result.stack, vec![Value::Number(2.0), Value::Number(1.0)]);
    let (result, _) = run("1 2; Clear; 3");
    assert_eq!(result.stack, vec![Value::Number(3.0)]);
}

#[test]
fn strings_are_sequences_of_units() {
    let source = "\
        Print Join \"foo\" \"bar\";\
        Print Substring 1 3 \"hello\";\
        Print Uppercase \"abc\";\
        Print Split \",\" \"a,b,c\";\
        Print Length \"h\u{e9}llo\";\
        Print First \"xyz\";\
        Print Character + 1 Ordinal \"a\";";
    assert_eq!(
        output_of(source),
        "foobar\nell\nABC\n(\"a\" \"b\" \"c\")\n5\nx\nb\n"
    );
}

#[test]
fn substring_is_range_checked() {
    let (result, _) = run("Substring 0 9 \"abc\"");
    assert!(result.error.starts_with("in Substring: "), "{}", result.error);
}

#[test]
fn lists_print_in_written_order() {
    assert_eq!(output_of("Print List (1 \"a\" \\b True);"), "(1 \"a\" \\b True)\n");
    assert_eq!(output_of("Print Range 0 3;"), "(0 1 2)\n");
    assert_eq!(output_of("Print First Reverse List (1 2 3);"), "3\n");
}

#[test]
fn malformed_numbers_are_rejected() {
    let (result, capture) = run("Print 1e5;");
    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(capture.output(), "");
    assert!(capture.errors()[0].starts_with("unexpected token: '1e5'"));
}

#[test]
fn nesting_depth_is_bounded() {
    let source = format!("{}Print 1{}", "Do (".repeat(400), ")".repeat(400));
    assert_eq!(output_of(&source), "1\n");

    let depth = MAX_BLOCK_DEPTH * 20;
    let source = format!("Print {}1{};", "(".repeat(depth), ")".repeat(depth));
    let (result, capture) = run(&source);
    assert_eq!(result.outcome, Outcome::Rejected);
    assert!(capture.errors()[0].starts_with("unexpected token: '('"));
}

#[test]
fn ranges_are_bounded() {
    let source = "Print Length Range 9007199254740992 9007199254740994;";
    assert_eq!(output_of(source), "2\n");
    let (result, _) = run("Range 0 1000000000000;");
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.error, "in Range: range from 0 to 1000000000000 is too long");
}

#[test]
fn regex_blocks_test_and_capture() {
    let source = "\
        Let Digits Regex \"^[0-9]+$\";\
        Print Do Digits \"123\";\
        Print Do Digits \"12a\";\
        Let Pair Regex-match \"(a+)(b+)\";\
        Print List (Do Pair \"xaabb\");";
    assert_eq!(output_of(source), "True\nFalse\n(True \"aa\" \"bb\")\n");
}

#[test]
fn invalid_regexes_fail_at_runtime() {
    let (result, _) = run("Regex \"(\"");
    assert!(result.error.starts_with("in Regex: regex compile error"), "{}", result.error);
}

#[test]
fn boxes_print_their_contents_once() {
    assert_eq!(output_of("Let B Box 1; Print B;"), "[1]\n");
    assert_eq!(output_of("Let B Box 1; Set B B; Print B;"), "[...]\n");
}

#[test]
fn show_makes_a_string() {
    let (result, capture) = run("Show List (1 2)");
    assert_eq!(result.stack, vec![Value::string("(1 2)")]);
    assert_eq!(capture.output(), "");
}

#[test]
fn type_predicates() {
    assert_eq!(
        output_of("Print Number? 1; Print String? 1; Print Block? (); Print Table? Table ();"),
        "True\nFalse\nTrue\nTrue\n"
    );
    let (result, _) = run("List! 1");
    assert_eq!(result.error, "in List!: list assertion failed");
}

#[test]
fn identifiers_ignore_case_after_the_first_letter() {
    assert_eq!(output_of("PRINT 1; pRINT 2;"), "1\n");
    assert_eq!(output_of("Let FOO 1; Print Foo;"), "1\n");
}
