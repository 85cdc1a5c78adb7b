// CMake build-system glue: test-suite injection, configure + compile, and
// ctest execution.

use std::{io::Write, time::Duration};

use crate::{
    error::Error,
    settings::Settings,
    utils::{path_join, syscommand_timeout, SyscommandSettings},
};

/// Appends an include of the test suite's CMakeLists to the student
/// CMakeLists, so the instructor tests build as part of the student project.
/// The modification is undone after the run with `repo::stash`.
pub fn inject_tests(student_dir: &str, test_dir: &str) -> Result<(), Error> {
    let cmakelists = path_join(student_dir, "CMakeLists.txt")?;
    let include_line = format!("\ninclude({})\n", path_join(test_dir, "CMakeLists.txt")?);

    log::info!("Injecting test suite include into {cmakelists}");
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .open(&cmakelists)
        .inspect_err(|e| log::error!("Could not open {cmakelists} for appending: {e}"))?;
    f.write_all(include_line.as_bytes())?;
    Ok(())
}

/// Configures and compiles the combined project. Returns the exit code of
/// the first failing step, or 0 when the submission built.
pub fn build(settings: &Settings, source_root: &str, build_dir_name: &str) -> Result<i32, Error> {
    let cmd_settings = SyscommandSettings {
        timeout: Duration::from_secs(settings.grading.build_timeout),
        expected_code: None,
        cwd: Some(source_root.to_string()),
    };

    log::info!(
        "Configuring {source_root} with generator {}",
        settings.grading.cmake_generator
    );
    let configure = syscommand_timeout(
        &[
            "cmake",
            "-B",
            build_dir_name,
            "-G",
            &settings.grading.cmake_generator,
        ],
        cmd_settings.clone(),
    )?;
    if configure.code != 0 {
        log::error!(
            "Configure step exited with code {}: {}",
            configure.code,
            configure.stderr
        );
        return Ok(configure.code);
    }

    let build_dir = path_join(source_root, build_dir_name)?;
    log::info!("Compiling with {}", settings.grading.generator_cmd);
    let compile = syscommand_timeout(
        &[settings.grading.generator_cmd.as_str()],
        SyscommandSettings {
            cwd: Some(build_dir),
            ..cmd_settings
        },
    )?;
    if compile.code != 0 {
        log::error!(
            "Compile step exited with code {}: {}",
            compile.code,
            compile.stderr
        );
    }
    Ok(compile.code)
}

/// Runs the compiled test suite with `ctest -O`, writing the transcript file
/// into the build directory as a side effect. ctest exits non-zero whenever
/// any test fails, so its exit code never gates the pipeline; outcomes are
/// read from the transcript.
pub fn run_tests(settings: &Settings, build_dir: &str) -> Result<(), Error> {
    log::info!("Running ctest in {build_dir}");
    let output = syscommand_timeout(
        &["ctest", "-O", &settings.grading.transcript_name],
        SyscommandSettings {
            timeout: Duration::from_secs(settings.grading.test_timeout),
            expected_code: None,
            cwd: Some(build_dir.to_string()),
        },
    )?;
    if output.code != 0 {
        log::info!("ctest exited with code {}", output.code);
    }
    Ok(())
}
