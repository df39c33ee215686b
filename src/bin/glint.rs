//! Command-line interface for glint
//! Highlights source files with the bundled grammars and prints the result in one of
//! the registered output formats.
//!
//! Usage:
//!   glint highlight `<path>` [--language `<name>`] [--format `<format>`]  - Highlight a file ('-' reads stdin)
//!   glint detect `<path>` [--among `<names>`]                           - Report the best matching grammar
//!   glint list                                                        - List the bundled grammars
//!   glint formats                                                     - List the output formats
//!
//! Every command accepts `--config <file>` to layer a TOML file over the defaults,
//! `--strict` to report engine faults instead of falling back to plain text, and
//! `--class-prefix <prefix>` to change the HTML class prefix.
//! Set `RUST_LOG` (e.g. `RUST_LOG=glint=debug`) to see engine diagnostics on stderr.

use clap::{Arg, ArgAction, ArgMatches, Command};
use config::ConfigError;
use glint::config::Loader;
use glint::formats::FormatRegistry;
use glint::{HighlightConfig, HighlightResult, Highlighter};
use std::io::Read;

fn main() {
    init_tracing();

    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .help("TOML file layered over the default configuration")
        .global(true);
    let strict_arg = Arg::new("strict")
        .long("strict")
        .help("Fail on internal engine faults instead of printing plain text")
        .action(ArgAction::SetTrue)
        .global(true);
    let class_prefix_arg = Arg::new("class-prefix")
        .long("class-prefix")
        .help("Prefix for class names in HTML output")
        .global(true);

    let matches = Command::new("glint")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A grammar-driven syntax highlighter")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(config_arg)
        .arg(strict_arg)
        .arg(class_prefix_arg)
        .subcommand(
            Command::new("highlight")
                .about("Highlight a file and print the result")
                .arg(
                    Arg::new("path")
                        .help("Path to the file to highlight, or '-' for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .help("Grammar to use; auto-detected when omitted"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (e.g., 'html', 'json', 'treeviz')")
                        .default_value("html"),
                )
                .arg(
                    Arg::new("ignore-illegals")
                        .long("ignore-illegals")
                        .help("Keep going past sequences the grammar declares illegal")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("detect")
                .about("Report which grammar fits a file best")
                .arg(
                    Arg::new("path")
                        .help("Path to the file to inspect, or '-' for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("among")
                        .long("among")
                        .help("Comma separated candidate grammars")
                        .value_delimiter(','),
                ),
        )
        .subcommand(Command::new("list").about("List the bundled grammars"))
        .subcommand(Command::new("formats").about("List all available output formats"))
        .get_matches();

    let config = load_config(&matches);
    let mut highlighter = Highlighter::with_bundled_languages();
    highlighter.configure(config);

    match matches.subcommand() {
        Some(("highlight", highlight_matches)) => {
            handle_highlight_command(&highlighter, highlight_matches);
        }
        Some(("detect", detect_matches)) => {
            handle_detect_command(&highlighter, detect_matches);
        }
        Some(("list", _)) => {
            handle_list_command(&highlighter);
        }
        Some(("formats", _)) => {
            handle_formats_command(highlighter.config());
        }
        _ => unreachable!(),
    }
}

/// Install a stderr subscriber, but only when `RUST_LOG` asks for one.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> HighlightConfig {
    build_config(matches).unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        std::process::exit(1);
    })
}

/// Defaults, then `--config`, then the flags that override single keys.
fn build_config(matches: &ArgMatches) -> Result<HighlightConfig, ConfigError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if matches.get_flag("strict") {
        loader = loader.set_override("safe_mode", false)?;
    }
    if let Some(prefix) = matches.get_one::<String>("class-prefix") {
        loader = loader.set_override("class_prefix", prefix.as_str())?;
    }
    loader.build()
}

fn read_source(path: &str) -> String {
    let read = if path == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source).map(|_| source)
    } else {
        std::fs::read_to_string(path)
    };
    read.unwrap_or_else(|e| {
        eprintln!("Error reading file: {}", e);
        std::process::exit(1);
    })
}

/// Handle the highlight command
fn handle_highlight_command(highlighter: &Highlighter, matches: &ArgMatches) {
    let path = matches.get_one::<String>("path").unwrap();
    let format = matches.get_one::<String>("format").unwrap();
    let ignore_illegals = matches.get_flag("ignore-illegals");
    let source = read_source(path);

    let result = match matches.get_one::<String>("language") {
        Some(language) => highlighter.highlight(language, &source, ignore_illegals),
        None => highlighter.highlight_auto(&source),
    }
    .unwrap_or_else(|e| {
        eprintln!("Highlighting error: {}", e);
        std::process::exit(1);
    });

    if let Some(illegal) = &result.illegal_by {
        eprintln!("Warning: {} (at byte {})", illegal.message, illegal.index);
    }

    let registry = FormatRegistry::with_config(highlighter.config());
    let output = registry.serialize(&result, format).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("\nAvailable formats:");
        for name in registry.list_formats() {
            eprintln!("  {}", name);
        }
        std::process::exit(1);
    });
    println!("{}", output);
}

/// Handle the detect command
fn handle_detect_command(highlighter: &Highlighter, matches: &ArgMatches) {
    let path = matches.get_one::<String>("path").unwrap();
    let source = read_source(path);

    let result = match matches.get_many::<String>("among") {
        Some(among) => {
            let candidates: Vec<&String> = among.collect();
            highlighter.highlight_auto_among(&source, candidates.as_slice())
        }
        None => highlighter.highlight_auto(&source),
    }
    .unwrap_or_else(|e| {
        eprintln!("Detection error: {}", e);
        std::process::exit(1);
    });

    print_detection(&result);
}

fn print_detection(result: &HighlightResult) {
    println!("{} (relevance {})", result.language, result.relevance);
    if let Some(second) = &result.second_best {
        println!("runner-up: {} (relevance {})", second.language, second.relevance);
    }
}

/// Handle the list command
fn handle_list_command(highlighter: &Highlighter) {
    println!("Bundled grammars:\n");
    for name in highlighter.list_grammars() {
        if let Some(grammar) = highlighter.get_grammar(name) {
            let definition = grammar.definition();
            if definition.aliases.is_empty() {
                println!("  {:<8} {}", name, definition.name);
            } else {
                println!(
                    "  {:<8} {} (aliases: {})",
                    name,
                    definition.name,
                    definition.aliases.join(", ")
                );
            }
        }
    }
}

/// Handle the formats command
fn handle_formats_command(config: &HighlightConfig) {
    let registry = FormatRegistry::with_config(config);
    println!("Available formats:\n");
    for name in registry.list_formats() {
        if let Some(formatter) = registry.get(&name) {
            println!("  {:<8} {}", name, formatter.description());
        }
    }
}
