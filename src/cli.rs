//! # Command-Line Interface / 命令行接口
//!
//! Builds the clap command tree with localized help texts and dispatches to
//! the `run`, `init` and `report` commands.
//!
//! 使用本地化帮助文本构建 clap 命令树，并分派到 `run`、`init` 与 `report` 命令。

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::CONFIG_FILE_NAME;
use crate::infra::logging::setup_logging;
use crate::infra::t;

pub mod commands;

use commands::run::RunOptions;

/// Pre-parses the command line arguments to find an explicit language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` and `--lang=<VALUE>`.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter().enumerate().find_map(|(pos, arg)| {
        if arg == "--lang" {
            args.get(pos + 1).cloned()
        } else {
            arg.strip_prefix("--lang=").map(str::to_string)
        }
    })
}

fn build_cli(locale: &str) -> Command {
    Command::new("api-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help(t!("cli_log_level", locale = locale).to_string())
                .value_name("LEVEL")
                .default_value("warn")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .help(t!("cli_log_json", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value(CONFIG_FILE_NAME)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("base-url")
                        .long("base-url")
                        .help(t!("arg_base_url", locale = locale).to_string())
                        .value_name("URL")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("env")
                        .long("env")
                        .help(t!("arg_env", locale = locale).to_string())
                        .value_name("ENVIRONMENT")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("concurrency")
                        .short('j')
                        .long("concurrency")
                        .help(t!("arg_concurrency", locale = locale).to_string())
                        .value_name("WORKERS")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help(t!("arg_timeout", locale = locale).to_string())
                        .value_name("MILLISECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help(t!("arg_category", locale = locale).to_string())
                        .value_name("CATEGORY")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .value_name("JSON")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("insights")
                        .long("insights")
                        .help(t!("arg_insights", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_output", locale = locale).to_string())
                        .value_name("PATH")
                        .default_value(CONFIG_FILE_NAME)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("report")
                .about(t!("cmd_report_about", locale = locale).to_string())
                .arg(
                    Arg::new("input")
                        .help(t!("arg_input", locale = locale).to_string())
                        .value_name("REPORT_JSON")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
}

fn run_options(matches: &ArgMatches) -> RunOptions {
    RunOptions {
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        base_url: matches.get_one::<String>("base-url").cloned(),
        environment: matches.get_one::<String>("env").cloned(),
        concurrency: matches.get_one::<usize>("concurrency").copied(),
        timeout_ms: matches.get_one::<u64>("timeout").copied(),
        categories: matches
            .get_many::<String>("category")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        html: matches.get_one::<PathBuf>("html").cloned(),
        json: matches.get_one::<PathBuf>("json").cloned(),
        insights: matches.get_flag("insights"),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language();
    let language = explicit_language
        .clone()
        .unwrap_or_else(crate::detect_locale);
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    setup_logging(matches.get_flag("log-json"), log_level);

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(run_options(run_matches), explicit_language).await?;
        }
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");
            let force = init_matches.get_flag("force");
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

            // Show language detection message if it was auto-detected
            if explicit_language.is_none() && !non_interactive {
                println!(
                    "{}",
                    t!("system_language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::run_init_wizard(&output, &language, non_interactive, force)?;
        }
        Some(("report", report_matches)) => {
            // `input` is required, clap rejects the command line without it.
            if let Some(input) = report_matches.get_one::<PathBuf>("input") {
                let html = report_matches.get_one::<PathBuf>("html").cloned();
                commands::report::execute(input, html, &language)?;
            }
        }
        _ => {
            // `subcommand_required` makes clap print help before we get here.
        }
    }
    Ok(())
}
