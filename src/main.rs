use clap::Parser;

use ctest_autograder::{
    cmake,
    error::Error,
    repo,
    report::Report,
    settings::Settings,
    transcript::Transcript,
    utils::path_join,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML file containing the grader settings
    #[arg(short, long)]
    settings: String,

    /// Address of the student repository to grade
    student_repo: String,

    /// Revision of the student repository to check out. Defaults to the
    /// latest commit on the configured branch.
    revision: Option<String>,
}

fn main() -> Result<(), Error> {
    let args: Args = Args::parse();
    let settings = Settings::load(&args.settings)?;
    settings.setup_logging()?;

    log::info!("{} grading {}", settings.name, args.student_repo);

    let grading = &settings.grading;

    repo::sync(&settings, &grading.test_repo, &grading.test_dir, None)?;
    repo::sync(
        &settings,
        &args.student_repo,
        &grading.student_dir,
        args.revision.as_deref(),
    )?;

    cmake::inject_tests(&grading.student_dir, &grading.test_dir)?;

    let build_code = cmake::build(&settings, &grading.student_dir, &grading.build_dir)?;
    if build_code != 0 {
        log::error!("Submission failed to build (exit code {build_code}), emitting no report");
        restore_working_trees(&settings);
        return Err(Error::BuildError { code: build_code });
    }

    let build_dir = path_join(&grading.student_dir, &grading.build_dir)?;
    cmake::run_tests(&settings, &build_dir)?;

    let transcript_path = path_join(&build_dir, &grading.transcript_name)?;
    let transcript = Transcript::load(&transcript_path)?;
    let report = Report::project(&transcript, &grading.package_name, &grading.failure_class)?;
    report.write(&grading.report_file)?;

    restore_working_trees(&settings);

    log::info!("Grading of {} done", args.student_repo);
    Ok(())
}

/// Drops the injected include line (and any other build-side modifications)
/// from both working trees.
fn restore_working_trees(settings: &Settings) {
    repo::stash(settings, &settings.grading.student_dir)
        .unwrap_or_else(|e| log::warn!("Could not restore student working tree: {e}"));
    repo::stash(settings, &settings.grading.test_dir)
        .unwrap_or_else(|e| log::warn!("Could not restore test working tree: {e}"));
}
