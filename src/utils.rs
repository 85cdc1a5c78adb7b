use crate::error::Error;
use std::{ffi::OsString, path::Path, time::Duration};
use subprocess::{ExitStatus, Popen, PopenConfig, Redirection};

/// Joins two file system paths together.
pub fn path_join<A: AsRef<Path>, B: AsRef<Path>>(a: A, b: B) -> Result<String, Error> {
    a.as_ref()
        .join(b.as_ref())
        .to_str()
        .map(String::from)
        .ok_or(Error::from("Could not convert path to a string."))
}

/// Joins two file system paths together and returns the absolute path of the
/// result.
pub fn path_absolute_join<A: AsRef<Path>, B: AsRef<Path>>(a: A, b: B) -> Result<String, Error> {
    std::path::absolute(a.as_ref().join(b.as_ref()))?
        .to_str()
        .map(String::from)
        .ok_or(Error::from("Could not convert path to a string."))
}

/// Returns the absolute parent path of the provided string, which can succeed
/// even if the path doesn't exist.
pub fn path_absolute_parent<P: AsRef<Path>>(path: P) -> Result<String, Error> {
    std::path::absolute(path.as_ref())?
        .parent()
        .map(|e| e.to_owned())
        .and_then(|p| p.to_str().map(String::from))
        .ok_or(Error::from("Internal error: Could not get parent of path."))
}

#[derive(Debug, Clone)]
pub struct SyscommandSettings {
    pub timeout: Duration,
    pub expected_code: Option<i32>,
    pub cwd: Option<String>,
}

impl Default for SyscommandSettings {
    fn default() -> Self {
        SyscommandSettings {
            timeout: Duration::from_secs(60),
            expected_code: None,
            cwd: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyscommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a command with a timeout, capturing its output.
/// On success, returns code, stdout, and stderr.
///
/// Example, to run a simple command:
/// ```
/// use ctest_autograder::utils::{
///     syscommand_timeout, SyscommandSettings};
///
/// let ret = syscommand_timeout(
///     ["echo", "foo"],
///     SyscommandSettings::default()
/// ).unwrap();
///
/// println!("Returned {}", ret.code);
/// ```
pub fn syscommand_timeout<S: AsRef<str>, CmdList: AsRef<[S]>>(
    cmd: CmdList,
    cmd_settings: SyscommandSettings,
) -> Result<SyscommandOutput, Error> {
    let os_cmd: Vec<OsString> = cmd
        .as_ref()
        .iter()
        .map(|s| OsString::from(s.as_ref()))
        .collect();

    let mut handle = Popen::create(
        &os_cmd,
        PopenConfig {
            stdout: Redirection::Pipe,
            stderr: Redirection::Pipe,
            cwd: cmd_settings.cwd.as_ref().map(OsString::from),
            ..Default::default()
        },
    )
    .map_err(|e| Error::from(format!("Could not create Popen process: {e}")))?;

    // Both pipes are drained with a wall-clock limit. A child that keeps
    // writing past the limit is killed and reported as a timeout, with
    // whatever output was captured so far attached.
    let (stdout, stderr) = match handle
        .communicate_start(None)
        .limit_time(cmd_settings.timeout)
        .read_string()
    {
        Ok((out, err)) => (out.unwrap_or_default(), err.unwrap_or_default()),
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            log::warn!("(Terminating process) Timed out waiting for output: {e}");
            handle
                .kill()
                .unwrap_or_else(|e| log::error!("Could not kill timed out process: {e}"));
            handle
                .wait()
                .map(|_| ())
                .unwrap_or_else(|e| log::error!("Could not reap timed out process: {e}"));
            let (out, err) = e.capture;
            return Err(Error::SyscommandTimeoutError {
                stdout: out.map(|b| String::from_utf8_lossy(&b).into_owned()),
                stderr: err.map(|b| String::from_utf8_lossy(&b).into_owned()),
            });
        }
        Err(e) => {
            log::warn!("(Terminating process) Runtime error reading its output: {e}");
            handle
                .kill()
                .unwrap_or_else(|e| log::error!("Could not kill process: {e}"));
            return Err(Error::from(format!("Error reading process output: {e}")));
        }
    };

    let wait_result = match handle.wait_timeout(cmd_settings.timeout)? {
        Some(stat) => stat,
        None => {
            handle
                .kill()
                .unwrap_or_else(|e| log::error!("Could not kill timed out process: {e}"));
            return Err(Error::SyscommandTimeoutError {
                stdout: Some(stdout),
                stderr: Some(stderr),
            });
        }
    };

    match wait_result {
        ExitStatus::Exited(ucode) => {
            let code = ucode as i32;
            if cmd_settings.expected_code.map_or(true, |ec| ec == code) {
                Ok(SyscommandOutput {
                    code: code,
                    stdout: stdout,
                    stderr: stderr,
                })
            } else {
                Err(format!("Exited with unexpected code {code}").into())
            }
        }
        ExitStatus::Signaled(sig) => Err(format!("Terminated by signal {sig}").into()),
        ExitStatus::Other(v) => Err(format!("Unknown exit status {v}").into()),
        ExitStatus::Undetermined => Err("Undetermined error".into()),
    }
}
