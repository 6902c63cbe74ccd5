use std::{cell::Cell, rc::Rc};

use argtree::{Cli, ConfigError, ExitCode, Flag, Taken, Value};
use expect_test::expect;

use crate::run;

#[test]
fn handles_see_parsed_values() {
    let mut cli = Cli::new("tune", "");
    let (flag, workers) = Flag::uint(1).short("w").long("workers").build();
    cli.add_flag(flag);
    let (flag, limit) = Flag::uint64(0).long("limit").build();
    cli.add_flag(flag);
    let (flag, offset) = Flag::int64(0).long("offset").build();
    cli.add_flag(flag);
    let (flag, ratio) = Flag::float64(0.5).long("ratio").build();
    cli.add_flag(flag);
    let (flag, separator) = Flag::rune(',').long("separator").build();
    cli.add_flag(flag);
    let (flag, verbose) = Flag::bool(false).short("v").build();
    cli.add_flag(flag);

    let calls = Rc::new(Cell::new(0));
    cli.set_action({
        let calls = Rc::clone(&calls);
        move || calls.set(calls.get() + 1)
    });

    let (code, output) = run(
        &mut cli,
        "-w 0o17 --limit 18446744073709551615 --offset 9_000 --ratio 1e3 --separator \\t -v",
        &[],
    );
    assert_eq!((code, output.as_str()), (ExitCode::Success, ""));
    assert_eq!(calls.get(), 1);
    assert_eq!(workers.get(), 15);
    assert_eq!(limit.get(), u64::MAX);
    assert_eq!(offset.get(), 9000);
    assert_eq!(ratio.get(), 1000.0);
    assert_eq!(separator.get(), '\t');
    assert_eq!(separator.text(), "\\t");
    assert!(verbose.get());

    let (code, _) = run(&mut cli, "-v", &[]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(calls.get(), 2);
    assert_eq!(workers.get(), 1);
    assert_eq!(separator.get(), ',');
}

#[test]
fn out_of_range_values() {
    let mut cli = Cli::new("tune", "");
    let (flag, _) = Flag::uint64(0).long("limit").build();
    cli.add_flag(flag);
    let (flag, _) = Flag::rune(' ').long("separator").build();
    cli.add_flag(flag);

    let (code, output) = run(&mut cli, "--limit 18446744073709551616", &[]);
    assert_eq!(code, ExitCode::CliUsageError);
    assert!(output.starts_with(
        "Unable to process value for flag: --limit. parsing \"18446744073709551616\": value out of range\n"
    ));

    let (code, output) = run(&mut cli, "--separator abc", &[]);
    assert_eq!(code, ExitCode::CliUsageError);
    assert!(output.starts_with(
        "Unable to process value for flag: --separator. Must contain a single character or escaped character\n"
    ));
}

#[test]
fn custom_handlers_and_validators() {
    let mut cli = Cli::new("fetch", "");
    // Takes the value glued to the flag instead of the next token.
    let (flag, level) = Flag::string("")
        .long("level")
        .option_handler(|_, next| Ok(Taken { value: format!("<{next}>"), consumed: false }))
        .build();
    cli.add_flag(flag);
    let (flag, bucket) = Flag::string("")
        .short("b")
        .validator(|value| match value {
            Value::String(name) if name.starts_with('_') => {
                Err("Bucket names can't start with `_`".into())
            }
            Value::String(name) => {
                *name = name.to_lowercase();
                Ok(())
            }
            _ => Ok(()),
        })
        .build();
    cli.add_flag(flag);
    cli.set_action(|| ());

    let (code, _) = run(&mut cli, "--level -b Travel", &[]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(level.get(), "<-b>");
    assert_eq!(bucket.get(), "travel");

    let (code, output) = run(&mut cli, "-b _system", &[]);
    assert_eq!(code, ExitCode::CliUsageError);
    expect![[r#"
        Bucket names can't start with `_`

        fetch [<args>]

        Optional Flags:

             --level
          -b
          -h,--help                   Prints the help message

    "#]]
    .assert_eq(&output);
}

#[test]
fn validators_cannot_change_value_kind() {
    let mut cli = Cli::new("fetch", "");
    let (flag, bucket) = Flag::string("")
        .short("b")
        .long("bucket")
        .validator(|value| {
            *value = Value::Int(1);
            Ok(())
        })
        .build();
    cli.add_flag(flag);
    let calls = Rc::new(Cell::new(0));
    cli.set_action({
        let calls = Rc::clone(&calls);
        move || calls.set(calls.get() + 1)
    });

    let (code, output) = run(&mut cli, "-b travel", &[]);
    assert_eq!(code, ExitCode::CliUsageError);
    assert!(output.starts_with("Validator for -b/--bucket changed the type of its value\n\n"));
    assert_eq!(calls.get(), 0);
    assert_eq!(bucket.get(), "travel");
}

#[test]
fn conflicting_names() {
    let mut cli = Cli::new("fetch", "");
    cli.add_flag(Flag::string("").short("b").long("bucket").build().0);
    assert_eq!(
        cli.try_add_flag(Flag::bool(false).short("b").build().0),
        Err(ConfigError::DuplicateFlag("b".to_string()))
    );
    assert_eq!(
        cli.try_add_flag(Flag::bool(false).long("help").build().0),
        Err(ConfigError::DuplicateFlag("help".to_string()))
    );
}

#[test]
fn long_names_wrap_onto_their_own_line() {
    let mut cli = Cli::new("fetch", "");
    cli.add_flag(
        Flag::string("")
            .long("very-long-flag-name-for-testing")
            .desc("A flag whose name does not fit in the names column")
            .required()
            .build()
            .0,
    );
    expect![[r#"
        Required Flags:

             --very-long-flag-name-for-testing
                                      A flag whose name does not fit in the names column

        Optional Flags:

          -h,--help                   Prints the help message

    "#]]
    .assert_eq(&cli.usage());
}
