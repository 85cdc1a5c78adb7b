use serde::Deserialize;
use toml;

use crate::error::Error;
use crate::utils::{path_absolute_join, path_absolute_parent, path_join};

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub name: String,

    pub log: LoggingSettings,
    pub grading: GradingSettings,

    #[serde(skip)]
    pub reldir: String,
}

/// Logging settings
#[derive(Deserialize, Debug, Clone)]
pub struct LoggingSettings {
    /// Directory where to store log messages
    pub dir: String,

    /// Whether to output debug messages.
    pub verbose: bool,
}

/// Settings for a single grading run
#[derive(Deserialize, Debug, Clone)]
pub struct GradingSettings {
    /// Address of the repository containing the instructor test suite
    pub test_repo: String,

    /// Directory to keep the test suite checked out in
    pub test_dir: String,

    /// Directory to keep the student submission checked out in
    pub student_dir: String,

    /// Name of the build directory, relative to the student directory
    pub build_dir: String,

    /// Branch that is pulled when synchronizing repositories
    pub branch: String,

    /// CMake generator to pass to the configure step
    pub cmake_generator: String,

    /// The command that drives the compile step for the chosen generator
    pub generator_cmd: String,

    /// Package name stamped on every entry of the report
    pub package_name: String,

    /// Name of the transcript file written by ctest, relative to the build
    /// directory
    pub transcript_name: String,

    /// Path of the report artifact to write
    pub report_file: String,

    /// Classification marker placed in the failure object of every failed
    /// report entry
    pub failure_class: String,

    /// Timeout (in seconds) for a single repository sync command
    pub sync_timeout: u64,

    /// Timeout (in seconds) for each of the configure and compile steps
    pub build_timeout: u64,

    /// Timeout (in seconds) for the whole ctest run
    pub test_timeout: u64,
}

impl Settings {
    /// Loads settings from the specified path
    pub fn load(path: &str) -> Result<Self, Error> {
        let contents: String = std::fs::read_to_string(path)
            .inspect_err(|e| eprintln!("Could not load settings from \"{path}\": {e}"))?;
        let mut s: Settings = toml::from_str(&contents)
            .inspect_err(|e| eprintln!("Error parsing settings from \"{path}\": {e}"))?;

        // Paths in the settings file are relative to the directory it lives in.
        s.reldir = path_absolute_parent(path)?;

        s.log.dir = path_absolute_join(&s.reldir, &s.log.dir)?;
        s.grading.test_dir = path_absolute_join(&s.reldir, &s.grading.test_dir)?;
        s.grading.student_dir = path_absolute_join(&s.reldir, &s.grading.student_dir)?;
        s.grading.report_file = path_absolute_join(&s.reldir, &s.grading.report_file)?;

        if let Ok(log_dir) = std::env::var("AUTOGRADER_LOG_DIR") {
            s.log.dir = log_dir;
        }
        if let Ok(truth_value) = std::env::var("AUTOGRADER_LOG_VERBOSE") {
            s.log.verbose = match truth_value.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" => true,
                _ => false,
            };
        }
        if let Ok(test_repo) = std::env::var("AUTOGRADER_TEST_REPO") {
            s.grading.test_repo = test_repo;
        }
        if let Ok(branch) = std::env::var("AUTOGRADER_BRANCH") {
            s.grading.branch = branch;
        }
        if let Ok(package_name) = std::env::var("AUTOGRADER_PACKAGE_NAME") {
            s.grading.package_name = package_name;
        }

        Ok(s)
    }

    /// Sets up logging for the current process.
    pub fn setup_logging(self: &Self) -> Result<(), Error> {
        use log::LevelFilter::{Debug, Info};

        std::fs::create_dir_all(&self.log.dir).map_err(|e| {
            eprintln!(
                "Error creating directory {} for the log file: {}",
                &self.log.dir, e
            );
            e.to_string()
        })?;

        let path_logfile = path_join(&self.log.dir, "log.out")?;
        fern::Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{0} {1} {2}:{3}] {4}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    record.line().unwrap_or(0),
                    message
                ))
            })
            .level(if self.log.verbose { Debug } else { Info })
            .chain(std::io::stderr())
            .chain(
                fern::log_file(&path_logfile).inspect_err(|e| {
                    eprintln!("Error setting up log file {}: {}", &path_logfile, e)
                })?,
            )
            .apply()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asserting::prelude::*;
    use std::io::Write;

    static EXAMPLE_SETTINGS: &str = r#"
name = "ctest-autograder"

[log]
dir = "logs"
verbose = true

[grading]
test_repo = "https://github.com/kystyn/cmake_tester.git"
test_dir = "test"
student_dir = "student"
build_dir = "build"
branch = "master"
cmake_generator = "Ninja"
generator_cmd = "ninja"
package_name = "lesson"
transcript_name = "log.txt"
report_file = "results.json"
failure_class = "org.jetbrains.research.runner.data.UnknownFailureDatum"
sync_timeout = 120
build_timeout = 600
test_timeout = 600
"#;

    #[test]
    fn test_load_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(EXAMPLE_SETTINGS.as_bytes()).unwrap();
        drop(f);

        let s = Settings::load(path.to_str().unwrap()).unwrap();
        assert_that!(s.name.as_str()).is_equal_to("ctest-autograder");
        assert_that!(s.log.verbose).is_equal_to(true);
        assert_that!(s.grading.package_name.as_str()).is_equal_to("lesson");
        assert_that!(s.grading.build_dir.as_str()).is_equal_to("build");
        assert_that!(s.grading.transcript_name.as_str()).is_equal_to("log.txt");
        assert_that!(s.grading.sync_timeout).is_equal_to(120);

        // Relative paths resolve against the settings file's directory.
        assert_that!(s.reldir.as_str()).starts_with("/");
        assert_that!(s.grading.test_dir.as_str()).ends_with("/test");
        assert_that!(s.grading.student_dir.as_str()).ends_with("/student");
        assert_that!(s.grading.report_file.as_str()).ends_with("/results.json");
        assert_that!(s.log.dir.as_str()).ends_with("/logs");
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-settings.toml");
        assert_that!(Settings::load(path.to_str().unwrap())).is_err();
    }
}
