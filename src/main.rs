use front_builder::cli::Cli;
use front_builder::optimizer::{ProcessBackend, Toolchain};
use front_builder::pipeline::{self, BuildError, BuildEvent, BuildSession};
use front_builder::{config, manifest, output};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load → chdir → stage → resources → scripts → styles.
fn run(cli: &Cli) -> Result<(), BuildError> {
    let mut session = BuildSession::new(&cli.manifest_path(), cli.debug)?;

    let manifest = manifest::load_manifest(session.manifest_path())?;
    let builder_config = config::load_config(&session.app_path)?;
    // Resolve before chdir in case the executable was started via a relative path
    let exe_dir = config::executable_dir();

    let cwd = session.enter_app_path()?;
    output::print_build_event(&BuildEvent::WorkingDirectory(cwd));

    let toolchain = Toolchain::from_config(&builder_config.tools, &session.app_path, &exe_dir);

    pipeline::build(
        &session,
        &manifest,
        &toolchain,
        &ProcessBackend,
        &mut |event: BuildEvent| output::print_build_event(&event),
    )?;

    Ok(())
}
