//! The command-line driver.
//!
//! With a FILE argument the script runs to completion, with `arg` bound to
//! the remaining arguments and `env` to the process environment; an `Int`
//! result becomes the exit code. Without one (or with `--`), statements are
//! read from stdin line by line against a persistent session.

use std::{collections::BTreeMap, env, fs, io::BufRead as _, process::ExitCode};

use noumenon::{Object, ReplSession, Runner, StdPrint};

struct Options {
    file: Option<String>,
    quiet: bool,
    arguments: Vec<String>,
}

fn usage() {
    println!("Usage: noumenon [options] [FILE] [arguments...]");
    println!();
    println!("Options:");
    println!("  --quiet, -q       Don't show intro and diagnostics");
    println!();
    println!("If FILE is not given, use interactive mode.");
}

fn parse_options(args: Vec<String>) -> Result<Options, String> {
    let mut options = Options {
        file: None,
        quiet: false,
        arguments: vec![],
    };

    for arg in args {
        if options.file.is_some() {
            // everything after FILE belongs to the script
            options.arguments.push(arg);
        } else if arg == "--quiet" || arg == "-q" {
            options.quiet = true;
        } else if arg.starts_with('-') && arg != "--" {
            return Err(arg);
        } else {
            options.file = Some(arg);
        }
    }

    Ok(options)
}

fn main() -> ExitCode {
    let options = match parse_options(env::args().skip(1).collect()) {
        Ok(options) => options,
        Err(arg) => {
            println!("Unknown option '{arg}'");
            println!();
            usage();
            return ExitCode::FAILURE;
        }
    };

    match options.file.as_deref() {
        None | Some("--") => interactive(options.quiet),
        Some(file) => run_file(file, options.quiet, &options.arguments),
    }
}

fn interactive(quiet: bool) -> ExitCode {
    if !quiet {
        println!("Noumenon {}", env!("CARGO_PKG_VERSION"));
        println!("License GPLv3+: GNU GPL version 3 or later <http://gnu.org/licenses/gpl.html>");
        println!("This is free software: you are free to change and redistribute it.");
        println!("There is NO WARRANTY, to the extent permitted by law.");
    }

    let mut session = ReplSession::new().quiet(quiet);
    let mut print = StdPrint;

    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };

        match session.execute(&line, &mut print) {
            // a `return` surfaced a value; echo it
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(error) => println!("driver: {error}"),
        }
    }

    // stdin is exhausted: the session ran off the end, yielding the empty Object
    println!("{}", Object::empty());
    ExitCode::SUCCESS
}

fn run_file(path: &str, quiet: bool, arguments: &[String]) -> ExitCode {
    let Ok(bytes) = fs::read(path) else {
        println!("Unreadable file: {path}");
        println!();
        usage();
        return ExitCode::FAILURE;
    };
    let source = String::from_utf8_lossy(&bytes).into_owned();

    let arg = Object::Array(
        arguments
            .iter()
            .map(|argument| Object::Str(argument.clone()))
            .collect(),
    );
    let environment = Object::Object(
        env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    Object::Str(value.to_string_lossy().into_owned()),
                )
            })
            .collect::<BTreeMap<_, _>>(),
    );

    let runner = Runner::new(source)
        .quiet(quiet)
        .variable("arg", arg)
        .variable("env", environment);

    match runner.run(&mut StdPrint) {
        Ok(Object::Int(code)) => std::process::exit(code as i32),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            println!("driver: {error}");
            ExitCode::FAILURE
        }
    }
}
