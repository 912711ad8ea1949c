//! Main CLI application

use crate::config::{load_env_file, Config};
use crate::engine::schedule::{output_hours, restart_hours};
use crate::engine::template::{substitute_str, DelimiterStyle, ValueFormat};
use crate::error::{ConfigError, PrepError, Result};
use crate::task::base::{run_phases, Phase, Verbosity};
use crate::task::forecast::ForecastTask;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::path::PathBuf;

/// Build the clap command
fn build_command() -> Command {
    Command::new("runprep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prepare a numerical forecast model run")
        .arg(
            Arg::new("env-file")
                .short('f')
                .long("env-file")
                .value_name("FILE")
                .help("Environment file merged over the process environment")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("forecast")
                .about("Stage inputs and render control files for a forecast run")
                .arg(
                    Arg::new("spec")
                        .long("spec")
                        .value_name("FILE")
                        .help("Declarative staging spec (YAML)")
                        .required(true),
                )
                .arg(
                    Arg::new("through")
                        .long("through")
                        .value_name("PHASE")
                        .help("Last lifecycle phase to run")
                        .default_value("clean"),
                ),
        )
        .subcommand(
            Command::new("schedule")
                .about("Print computed forecast-hour schedules")
                .subcommand_required(true)
                .subcommand(
                    Command::new("output")
                        .about("Forecast hours at which output is written")
                        .arg(hour_arg("fhmin", "0"))
                        .arg(hour_arg("fhmax-hf", "0"))
                        .arg(hour_arg("fhout-hf", "1"))
                        .arg(hour_arg("fhmax", "120"))
                        .arg(hour_arg("fhout", "6")),
                )
                .subcommand(
                    Command::new("restart")
                        .about("Forecast hours at which restarts are written")
                        .arg(hour_arg("interval", "6"))
                        .arg(hour_arg("fhmax", "120"))
                        .arg(hour_arg("offset", "0")),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Substitute placeholders in a single template")
                .arg(
                    Arg::new("template")
                        .long("template")
                        .value_name("FILE")
                        .help("Template file to render")
                        .required(true),
                )
                .arg(
                    Arg::new("style")
                        .long("style")
                        .value_name("STYLE")
                        .help("Delimiter style: dollar-paren, dollar-curly, at-square, at-angle")
                        .default_value("dollar-paren"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("FILE")
                        .help("Destination file (stdout when omitted)"),
                ),
        )
}

fn hour_arg(name: &'static str, default: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("HOURS")
        .value_parser(value_parser!(i64))
        .default_value(default)
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Capture the configuration context, merging an env-file when given
fn capture_config(matches: &ArgMatches) -> Result<Config> {
    match matches.get_one::<String>("env-file") {
        Some(path) => Ok(load_env_file(&PathBuf::from(path))?),
        None => Ok(Config::from_env()),
    }
}

fn run_forecast(matches: &ArgMatches, verbosity: Verbosity) -> Result<()> {
    let config = capture_config(matches)?;
    let spec = PathBuf::from(
        matches
            .get_one::<String>("spec")
            .expect("spec is required"),
    );
    let through_name = matches
        .get_one::<String>("through")
        .expect("through has a default");
    let through = Phase::from_name(through_name).ok_or_else(|| {
        ConfigError::Invalid(format!("unknown lifecycle phase '{}'", through_name))
    })?;

    let mut task = ForecastTask::new(config, spec)?.with_verbosity(verbosity);
    run_phases(&mut task, through)
}

fn run_schedule(matches: &ArgMatches) -> Result<()> {
    let hour = |m: &ArgMatches, name: &str| -> i64 {
        *m.get_one::<i64>(name).expect("hour args have defaults")
    };

    let hours = match matches.subcommand() {
        Some(("output", m)) => output_hours(
            hour(m, "fhmin"),
            hour(m, "fhmax-hf"),
            hour(m, "fhout-hf"),
            hour(m, "fhmax"),
            hour(m, "fhout"),
        )?,
        Some(("restart", m)) => {
            restart_hours(hour(m, "interval"), hour(m, "fhmax"), hour(m, "offset"))?
        }
        _ => unreachable!("schedule requires a subcommand"),
    };

    println!(
        "{}",
        hours
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(())
}

fn run_render(matches: &ArgMatches) -> Result<()> {
    let config = capture_config(matches)?;
    let template = matches
        .get_one::<String>("template")
        .expect("template is required");
    let style_name = matches
        .get_one::<String>("style")
        .expect("style has a default");
    let style = DelimiterStyle::from_name(style_name).ok_or_else(|| {
        ConfigError::Invalid(format!("unknown delimiter style '{}'", style_name))
    })?;

    let text = fs::read_to_string(template)?;
    let rendered = substitute_str(&text, style, &config, &ValueFormat::default())?;

    match matches.get_one::<String>("out") {
        Some(out) => fs::write(out, rendered)?,
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let mut command = build_command();
    let matches = command.clone().get_matches();
    let verbosity = get_verbosity(&matches);

    match matches.subcommand() {
        Some(("forecast", sub)) => run_forecast(sub, verbosity),
        Some(("schedule", sub)) => run_schedule(sub),
        Some(("render", sub)) => run_render(sub),
        _ => {
            command.print_help().map_err(PrepError::Io)?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_verbosity_normal() {
        let cmd = build_command();
        let matches = cmd.get_matches_from(vec!["runprep"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Normal);
    }

    #[test]
    fn test_get_verbosity_flags() {
        let matches = build_command().get_matches_from(vec!["runprep", "-v"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Verbose);

        let matches = build_command().get_matches_from(vec!["runprep", "--silent"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Silent);
    }

    #[test]
    fn test_schedule_output_args_parse() {
        let matches = build_command().get_matches_from(vec![
            "runprep", "schedule", "output", "--fhmax", "24", "--fhmax-hf", "12", "--fhout-hf",
            "3",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let (_, output) = sub.subcommand().unwrap();
        assert_eq!(*output.get_one::<i64>("fhmax").unwrap(), 24);
        assert_eq!(*output.get_one::<i64>("fhout").unwrap(), 6);
    }

    #[test]
    fn test_forecast_requires_spec() {
        let result =
            build_command().try_get_matches_from(vec!["runprep", "forecast"]);
        assert!(result.is_err());
    }
}
