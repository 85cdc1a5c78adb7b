use std::convert::From;
use toml;

#[derive(Debug)]
pub enum Error {
    IOError(std::io::Error),
    SetLoggerError(log::SetLoggerError),
    TOMLDeError(toml::de::Error),
    JSONSerError(serde_json::Error),
    PopenError(subprocess::PopenError),
    SyscommandTimeoutError {
        stdout: Option<String>,
        stderr: Option<String>,
    },
    BuildError {
        code: i32,
    },
    TranscriptFormatError(String),
    RawError(String),
}

impl std::error::Error for Error {}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IOError(e) => {
                write!(f, "[IOError] {e}")
            }
            Error::SetLoggerError(e) => {
                write!(f, "[SetLoggerError] {e}")
            }
            Error::TOMLDeError(e) => {
                write!(f, "[TOMLDeError] {e}")
            }
            Error::JSONSerError(e) => {
                write!(f, "[JSONSerError] {e}")
            }
            Error::PopenError(e) => {
                write!(f, "[PopenError] {e}")
            }
            Error::SyscommandTimeoutError { .. } => {
                write!(f, "[SyscommandTimeoutError]")
            }
            Error::BuildError { code } => {
                write!(f, "[BuildError] build exited with code {code}")
            }
            Error::TranscriptFormatError(s) => {
                write!(f, "[TranscriptFormatError] {s}")
            }
            Error::RawError(s) => {
                write!(f, "{s}")
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IOError(e)
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(e: log::SetLoggerError) -> Self {
        Error::SetLoggerError(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::TOMLDeError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JSONSerError(e)
    }
}

impl From<subprocess::PopenError> for Error {
    fn from(e: subprocess::PopenError) -> Self {
        Error::PopenError(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::RawError(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::RawError(String::from(s))
    }
}
