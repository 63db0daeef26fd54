mod config;
mod test_runner;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::{LevelFilter, debug};

use config::Settings;
use fmxml::ComposeError;

const SUBCOMMANDS: &[&str] = &["convert", "compose", "decompile", "check", "test", "help"];

/// Global flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--config", "-o", "--output", "-c", "--category"];

#[derive(Parser)]
#[command(
    name = "fm-cp",
    version,
    about = "Convert FileMaker script text to and from clipboard XML"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (defaults to ./fm-cp.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose or decompile, depending on what the input looks like
    Convert(IoArgs),

    /// Script text to fmxmlsnippet XML
    Compose(IoArgs),

    /// fmxmlsnippet XML to script text
    Decompile(IoArgs),

    /// Parse and validate script text without writing anything
    Check(InputArgs),

    /// Run .test.txt case files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct IoArgs {
    /// Input file; `-` or omitted reads stdin
    input: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Input file; `-` or omitted reads stdin
    input: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.txt file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Auto,
    Compose,
    Decompile,
}

fn main() {
    let args = with_implicit_convert(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let settings = match config::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let no_color = cli.no_color || !settings.output.color;

    let exit_code = match cli.command {
        Command::Convert(io) => do_convert(io, Direction::Auto, &settings, no_color),
        Command::Compose(io) => do_convert(io, Direction::Compose, &settings, no_color),
        Command::Decompile(io) => do_convert(io, Direction::Decompile, &settings, no_color),
        Command::Check(input) => do_check(input, no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            test_runner::run_tests(path, no_color, &test_args.category)
        }
    };
    process::exit(exit_code);
}

/// `fm-cp file.txt` means `fm-cp convert file.txt`; a bare `fm-cp` converts stdin.
fn with_implicit_convert(mut args: Vec<String>) -> Vec<String> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if VALUE_FLAGS.contains(&arg) {
            i += 2;
            continue;
        }
        if arg == "-" || !arg.starts_with('-') {
            if !SUBCOMMANDS.contains(&arg) {
                args.insert(i, "convert".to_string());
            }
            return args;
        }
        if matches!(arg, "-h" | "--help" | "-V" | "--version") {
            return args;
        }
        i += 1;
    }
    args.push("convert".to_string());
    args
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Read a named file, or stdin for `-`/absent. Returns the display name and contents.
fn read_input(input: Option<&str>) -> Result<(String, String), String> {
    match input {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(("<stdin>".to_string(), text))
        }
        Some(path) => std::fs::read_to_string(path)
            .map(|text| (path.to_string(), text))
            .map_err(|e| format!("cannot read '{}': {}", path, e)),
    }
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), String> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| format!("cannot write '{}': {}", path.display(), e)),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn do_convert(args: IoArgs, direction: Direction, settings: &Settings, no_color: bool) -> i32 {
    let (name, source) = match read_input(args.input.as_deref()) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let direction = match direction {
        Direction::Auto if fmxml::is_snippet(&source) => Direction::Decompile,
        Direction::Auto => Direction::Compose,
        explicit => explicit,
    };
    debug!("{}: {:?}", name, direction);

    let mut files = SimpleFiles::new();
    let file_id = files.add(name, source.clone());
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    let emit = |diagnostic: &Diagnostic<usize>| {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, diagnostic);
    };

    let result = match direction {
        Direction::Decompile => match fmxml::decompile_with(&source, &settings.decompile_options()) {
            Ok(text) => text,
            Err(e) => {
                emit(&Diagnostic::error().with_message(e.to_string()));
                return 1;
            }
        },
        _ => match fmxml::compose_file(&source, file_id) {
            Ok(composed) => {
                for warning in &composed.warnings {
                    emit(&warning.to_diagnostic());
                }
                composed.xml
            }
            Err(ComposeError::Recognition(errors)) => {
                for error in &errors {
                    emit(&error.to_diagnostic());
                }
                return 1;
            }
            Err(ComposeError::Structure(validation)) => {
                for error in &validation.errors {
                    emit(&error.to_diagnostic(file_id));
                }
                for warning in &validation.warnings {
                    emit(&warning.to_diagnostic());
                }
                return 1;
            }
        },
    };

    match write_output(args.output.as_deref(), &result) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn do_check(args: InputArgs, no_color: bool) -> i32 {
    let (name, source) = match read_input(args.input.as_deref()) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(name.clone(), source.clone());
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    let emit = |diagnostic: &Diagnostic<usize>| {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, diagnostic);
    };

    let (steps, errors) = fmscript::parse_source(&source, file_id);
    for error in &errors {
        emit(&error.to_diagnostic());
    }

    let validation = fmscript::validate(&steps);
    for error in &validation.errors {
        emit(&error.to_diagnostic(file_id));
    }
    for warning in &validation.warnings {
        emit(&warning.to_diagnostic());
    }

    if errors.is_empty() && validation.is_valid() {
        eprintln!("ok: {} ({} steps)", name, steps.len());
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_argument_implies_convert() {
        assert_eq!(
            with_implicit_convert(argv(&["fm-cp", "script.txt"])),
            argv(&["fm-cp", "convert", "script.txt"])
        );
    }

    #[test]
    fn explicit_subcommand_is_kept() {
        assert_eq!(
            with_implicit_convert(argv(&["fm-cp", "decompile", "a.xml"])),
            argv(&["fm-cp", "decompile", "a.xml"])
        );
    }

    #[test]
    fn flag_values_are_not_mistaken_for_input() {
        assert_eq!(
            with_implicit_convert(argv(&["fm-cp", "--config", "x.toml", "in.txt", "-o", "out.xml"])),
            argv(&["fm-cp", "--config", "x.toml", "convert", "in.txt", "-o", "out.xml"])
        );
    }

    #[test]
    fn stdin_forms() {
        assert_eq!(with_implicit_convert(argv(&["fm-cp"])), argv(&["fm-cp", "convert"]));
        assert_eq!(
            with_implicit_convert(argv(&["fm-cp", "--no-color", "-"])),
            argv(&["fm-cp", "--no-color", "convert", "-"])
        );
    }

    #[test]
    fn help_is_left_alone() {
        assert_eq!(with_implicit_convert(argv(&["fm-cp", "--help"])), argv(&["fm-cp", "--help"]));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
