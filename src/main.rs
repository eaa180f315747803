//! Entry point and command-line handling

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use zh_flag_fix::error::FlagFixError;
use zh_flag_fix::flags::variant_for_code;
use zh_flag_fix::model::LogLevel;
use zh_flag_fix::{classify, config, logging, start, Config, Tab};

#[derive(Parser)]
#[command(name = "zh-flag-fix", version, about = "Fix Chinese flag icons in language switchers")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Correct flag icons in an HTML document
    Fix {
        /// Input HTML file, or `-` for stdin
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write plain icon URLs without a `?v=` suffix
        #[arg(long)]
        no_cache_bust: bool,

        /// Base URL of the flag icon set
        #[arg(long)]
        icon_base: Option<String>,

        /// Address the document was loaded from
        #[arg(long, default_value = "about:blank")]
        url: String,
    },
    /// Report which Chinese script a label names
    Classify {
        text: String,

        /// Explicit language code, as found in `data-lang` or `hreflang`
        #[arg(long)]
        code: Option<String>,
    },
    /// Show the config file, optionally saving a new log level
    Config {
        #[arg(long, value_enum)]
        set_log_level: Option<LogLevel>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Logging first, so config problems are reported.
    let _guard = logging::init(cli.log_level.unwrap_or_default(), cli.log_file.as_deref());
    let config = config::load();
    if let Some(level) = configured_level(cli.log_level, logging::env_override(), &config) {
        logging::set_verbosity(level);
    }

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("zh-flag-fix: {e}");
            ExitCode::FAILURE
        }
    }
}

/// The config file's level, unless the command line or `RUST_LOG` chose one.
fn configured_level(cli: Option<LogLevel>, env_override: bool, config: &Config) -> Option<LogLevel> {
    if cli.is_some() || env_override {
        None
    } else {
        Some(config.log_level)
    }
}

fn run(command: Command, mut config: Config) -> Result<(), FlagFixError> {
    match command {
        Command::Fix {
            input,
            output,
            no_cache_bust,
            icon_base,
            url,
        } => {
            if no_cache_bust {
                config.cache_bust = false;
            }
            if let Some(base) = icon_base {
                config.icon_base_url = base;
            }
            run_fix(&config, &input, output.as_deref(), &url)
        }
        Command::Classify { text, code } => {
            for line in classify_report(&text, code.as_deref()) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Config { set_log_level } => run_config(set_log_level),
    }
}

fn classify_report(text: &str, code: Option<&str>) -> Vec<String> {
    let mut lines = vec![classify(text, code).label().to_string()];
    if let Some(code) = code {
        let flag = variant_for_code(code).map_or("none", |t| t.code());
        lines.push(format!("code {code} -> {flag}"));
    }
    lines
}

fn run_fix(config: &Config, input: &Path, output: Option<&Path>, url: &str) -> Result<(), FlagFixError> {
    let html = read_input(input)?;
    info!(bytes = html.len(), input = %input.display(), "Loaded document");

    let mut tab = Tab::from_html(url, &html);
    if let Err(e) = start(&mut tab, config) {
        warn!(error = %e, "Flag corrector not started");
    }
    tab.run_until_idle();

    let stats = tab.stats();
    info!(
        matched = stats.matched,
        corrected = stats.corrected,
        "Flag correction finished"
    );

    let fixed = tab.serialize().map_err(FlagFixError::Serialize)?;
    match output {
        Some(path) => std::fs::write(path, fixed).map_err(|source| FlagFixError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => std::io::stdout()
            .write_all(fixed.as_bytes())
            .map_err(|source| FlagFixError::Write {
                path: PathBuf::from("-"),
                source,
            }),
    }
}

fn read_input(input: &Path) -> Result<String, FlagFixError> {
    let read_err = |source| FlagFixError::Read {
        path: input.to_path_buf(),
        source,
    };
    if input == Path::new("-") {
        let mut html = String::new();
        std::io::stdin().read_to_string(&mut html).map_err(read_err)?;
        Ok(html)
    } else {
        std::fs::read_to_string(input).map_err(read_err)
    }
}

fn run_config(set_log_level: Option<LogLevel>) -> Result<(), FlagFixError> {
    if let Some(level) = set_log_level {
        let path = config::save_log_level(level)?;
        logging::set_verbosity(level);
        info!(?level, path = %path.display(), "Log level updated");
    }
    let path = config::config_path().ok_or(FlagFixError::NoConfigDir)?;
    let current = config::load_from(&path);
    println!("{}", path.display());
    let json = serde_json::to_string_pretty(&current).map_err(|source| FlagFixError::Config {
        path: path.clone(),
        source,
    })?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_report_lines() {
        assert_eq!(classify_report("繁體中文", None), vec!["traditional"]);
        assert_eq!(classify_report("English", None), vec!["neither"]);
        assert_eq!(
            classify_report("", Some("zh_Hans_CN")),
            vec!["simplified", "code zh_Hans_CN -> CN"]
        );
        assert_eq!(
            classify_report("繁體中文 简体中文", Some("en")),
            vec!["both", "code en -> none"]
        );
        assert_eq!(
            classify_report("", Some("zh-Hant-TW")),
            vec!["traditional", "code zh-Hant-TW -> TW"]
        );
    }

    #[test]
    fn config_level_yields_to_explicit_choices() {
        let config = Config {
            log_level: LogLevel::Debug,
            ..Config::default()
        };
        assert_eq!(configured_level(None, false, &config), Some(LogLevel::Debug));
        assert_eq!(configured_level(Some(LogLevel::Warn), false, &config), None);
        assert_eq!(configured_level(None, true, &config), None);
    }

    #[test]
    fn unreadable_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = Command::Fix {
            input: dir.path().join("missing.html"),
            output: None,
            no_cache_bust: false,
            icon_base: None,
            url: "about:blank".into(),
        };
        assert!(matches!(
            run(command, Config::default()),
            Err(FlagFixError::Read { .. })
        ));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zh-flag-fix", "classify", "繁體中文", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(matches!(cli.command, Command::Classify { code: None, .. }));
    }
}
