use anyhow::{Context, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use quire::build::build;
use quire::config::Project;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quire=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("quire")
        .version(crate_version!())
        .about("Builds a static blog from Markdown")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site into the destination directory")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .help("Directory to search for quire.yaml [default: current directory]"),
                )
                .arg(
                    Arg::with_name("source")
                        .long("source")
                        .takes_value(true)
                        .help("Overrides the project's source directory"),
                )
                .arg(
                    Arg::with_name("destination")
                        .long("destination")
                        .short("o")
                        .takes_value(true)
                        .help("Overrides the project's destination directory"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(matches)) => run_build(matches),
        _ => Ok(()),
    };

    if let Err(err) = result {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run_build(matches: &ArgMatches) -> Result<()> {
    let project_directory = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Getting the current directory")?,
    };
    let project = Project::from_directory(&project_directory)?;

    let source = matches
        .value_of("source")
        .map(PathBuf::from)
        .unwrap_or(project.source_directory);
    let destination = matches
        .value_of("destination")
        .map(PathBuf::from)
        .unwrap_or(project.destination_directory);

    build(&source, &destination, &project.build).context("Building site")?;
    Ok(())
}
