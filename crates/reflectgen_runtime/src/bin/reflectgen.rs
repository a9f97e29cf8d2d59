//! reflectgen CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use reflectgen_builder::DEFAULT_TAG_WINDOW;
use reflectgen_foundation::Result;
use reflectgen_runtime::{Preprocessor, RunOptions, RunSummary, init_logging};

/// Generates RTTR registration code from annotated C++ headers.
#[derive(Debug, Parser)]
#[command(name = "reflectgen", version, about)]
struct Cli {
    /// Directory scanned for .cpp/.cxx translation units.
    project_root: PathBuf,

    /// Settings file, or a directory containing ReflectionSettings.json.
    settings: Option<PathBuf>,

    /// Remove previous outputs and regenerate every unit.
    #[arg(short, long)]
    rebuild: bool,

    /// Do not write the ast.json tree dump.
    #[arg(long)]
    no_dump: bool,

    /// Lines above a declaration in which its tag is looked for.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TAG_WINDOW)]
    tag_window: u32,

    /// Reflect tagged structs without TRTTI_ENABLE.
    #[arg(long)]
    implicit_struct_rtti: bool,
}

impl Cli {
    fn options(&self) -> RunOptions {
        let mut options = RunOptions::new(&self.project_root)
            .with_rebuild(self.rebuild)
            .with_dump(!self.no_dump)
            .with_tag_window(self.tag_window)
            .with_implicit_struct_rtti(self.implicit_struct_rtti);
        if let Some(settings) = &self.settings {
            options = options.with_settings(settings);
        }
        options
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    exit_status(Preprocessor::run(&cli.options()))
}

/// Diagnostics of a finished run were already logged as they were reported;
/// only a failure of the run itself is printed here.
fn exit_status(outcome: Result<RunSummary>) -> ExitCode {
    match outcome {
        Ok(summary) => ExitCode::from(summary.exit_code()),
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use reflectgen_foundation::{Error, ErrorKind};

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "reflectgen",
            "proj",
            "proj/conf",
            "-r",
            "--no-dump",
            "--tag-window",
            "5",
        ])
        .unwrap();
        let options = cli.options();
        assert_eq!(options.project_root, PathBuf::from("proj"));
        assert_eq!(options.settings, Some(PathBuf::from("proj/conf")));
        assert!(options.rebuild);
        assert!(!options.dump);
        assert_eq!(options.tag_window, 5);
        assert!(!options.implicit_struct_rtti);

        let defaults = Cli::try_parse_from(["reflectgen", "proj"]).unwrap().options();
        assert!(defaults.dump);
        assert_eq!(defaults.tag_window, DEFAULT_TAG_WINDOW);
        assert!(defaults.settings.is_none());
    }

    #[test]
    fn exit_status_follows_the_summary() {
        assert_eq!(exit_status(Ok(RunSummary::default())), ExitCode::SUCCESS);
        let failed = RunSummary {
            errors: 2,
            ..RunSummary::default()
        };
        assert_eq!(exit_status(Ok(failed)), ExitCode::from(1));
        let err = Error::new(ErrorKind::Settings("bad".into()));
        assert_eq!(exit_status(Err(err)), ExitCode::FAILURE);
    }
}
