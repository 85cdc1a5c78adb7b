// Projection of parsed test outcomes into the report consumed by the
// external grading service, and emission of the report artifact.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::{error::Error, transcript::Transcript, utils::path_absolute_parent};

/// Pass/fail classification of one executed test.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Successful,
    Failed,
}

/// Failure diagnostic attached to a FAILED result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FailureDatum {
    /// Classification marker expected by the grading service.
    #[serde(rename = "@class")]
    pub class: String,

    #[serde(rename = "nestedException")]
    pub nested_exception: String,
}

/// Result of one execution of a test case. `failure` is `null` exactly when
/// the status is SUCCESSFUL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub status: CaseStatus,
    pub failure: Option<FailureDatum>,
}

/// One graded test method.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    #[serde(rename = "packageName")]
    pub package_name: String,

    #[serde(rename = "methodName")]
    pub method_name: String,

    pub tags: Vec<String>,

    pub results: Vec<CaseResult>,
}

/// The full report artifact, in transcript order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub data: Vec<ReportEntry>,
}

impl Report {
    /// Projects parsed outcomes into report entries, in transcript order.
    ///
    /// The raw test name carries the grouping tag as a prefix, separated
    /// from the method name by the first `_`. That naming convention is a
    /// hard contract with the test suite, so a name without the delimiter
    /// aborts the run.
    pub fn project(
        transcript: &Transcript,
        package_name: &str,
        failure_class: &str,
    ) -> Result<Self, Error> {
        let mut report = Report::default();

        for outcome in transcript.outcomes.iter() {
            let (tag, method_name) = outcome.name.split_once('_').ok_or_else(|| {
                log::error!("Test name \"{}\" has no tag delimiter", outcome.name);
                Error::TranscriptFormatError(format!(
                    "test name \"{}\" has no tag delimiter",
                    outcome.name
                ))
            })?;

            let status = if outcome.passed {
                CaseStatus::Successful
            } else {
                CaseStatus::Failed
            };
            let failure = outcome.failure.as_ref().map(|detail| FailureDatum {
                class: failure_class.to_string(),
                nested_exception: detail.to_owned(),
            });

            report.data.push(ReportEntry {
                package_name: package_name.to_string(),
                method_name: method_name.to_string(),
                tags: vec![tag.to_string()],
                results: vec![CaseResult {
                    status: status,
                    failure: failure,
                }],
            });
        }

        let failed: Vec<&str> = report
            .data
            .iter()
            .filter(|e| e.results.iter().any(|r| r.status == CaseStatus::Failed))
            .map(|e| e.method_name.as_str())
            .collect();
        if failed.is_empty() {
            log::info!("All {} graded tests passed", report.data.len());
        } else {
            log::info!(
                "{} of {} graded tests failed: {}",
                failed.len(),
                report.data.len(),
                failed.iter().join(", ")
            );
        }

        Ok(report)
    }

    /// Serializes the report to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    /// Writes the report to `path` in one complete step. The JSON is staged
    /// in a temporary file next to the destination and renamed over it, so a
    /// partial report is never observable at `path`.
    pub fn write(&self, path: &str) -> Result<(), Error> {
        let contents = self.to_json()?;
        let parent = path_absolute_parent(path)?;

        let mut f = tempfile::NamedTempFile::new_in(&parent)?;
        f.write_all(contents.as_bytes())?;
        f.persist(path).map_err(|e| {
            log::error!("Could not persist report to {path}: {e}");
            Error::from(format!("Could not persist report to {path}: {e}"))
        })?;

        log::info!("Wrote report to {path}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{TestOutcome, Transcript};
    use asserting::prelude::*;

    static PACKAGE: &str = "lesson";
    static CLASS: &str = "org.jetbrains.research.runner.data.UnknownFailureDatum";

    fn outcome(ordinal: usize, name: &str, passed: bool, failure: Option<&str>) -> TestOutcome {
        TestOutcome {
            ordinal: ordinal,
            name: name.to_string(),
            passed: passed,
            failure: failure.map(String::from),
        }
    }

    #[test]
    fn test_identity_split_on_first_delimiter() {
        let t = Transcript {
            outcomes: vec![
                outcome(1, "unit_add", true, None),
                outcome(2, "unit_add_two", true, None),
            ],
        };
        let report = Report::project(&t, PACKAGE, CLASS).unwrap();
        assert_that!(report.data[0].tags[0].as_str()).is_equal_to("unit");
        assert_that!(report.data[0].method_name.as_str()).is_equal_to("add");
        assert_that!(report.data[1].tags[0].as_str()).is_equal_to("unit");
        assert_that!(report.data[1].method_name.as_str()).is_equal_to("add_two");
    }

    #[test]
    fn test_missing_delimiter_is_fatal() {
        let t = Transcript {
            outcomes: vec![outcome(1, "noUnderscorePresent", true, None)],
        };
        let res = Report::project(&t, PACKAGE, CLASS);
        assert_that!(&res).is_err();
        assert_that!(&res).err().satisfies(|e| match e {
            Error::TranscriptFormatError(_) => true,
            _ => false,
        });
    }

    #[test]
    fn test_status_and_failure_mapping() {
        let t = Transcript {
            outcomes: vec![
                outcome(1, "unit_add", true, None),
                outcome(2, "unit_sub", false, Some("assertion mismatch at line 10 ")),
            ],
        };
        let report = Report::project(&t, PACKAGE, CLASS).unwrap();

        assert_that!(report.data[0].results[0].status).is_equal_to(CaseStatus::Successful);
        assert_that!(&report.data[0].results[0].failure).is_equal_to(&None);

        assert_that!(report.data[1].results[0].status).is_equal_to(CaseStatus::Failed);
        assert_that!(&report.data[1].results[0].failure).is_equal_to(&Some(FailureDatum {
            class: CLASS.to_string(),
            nested_exception: "assertion mismatch at line 10 ".to_string(),
        }));
    }

    #[test]
    fn test_failure_details_follow_transcript_order() {
        let t = Transcript {
            outcomes: vec![
                outcome(1, "unit_a", false, Some("first detail ")),
                outcome(2, "unit_b", true, None),
                outcome(3, "unit_c", false, Some("second detail ")),
                outcome(4, "unit_d", false, Some("third detail ")),
            ],
        };
        let report = Report::project(&t, PACKAGE, CLASS).unwrap();
        let details: Vec<String> = report
            .data
            .iter()
            .filter_map(|e| e.results[0].failure.as_ref())
            .map(|f| f.nested_exception.to_owned())
            .collect();
        assert_that!(details).is_equal_to(vec![
            "first detail ".to_string(),
            "second detail ".to_string(),
            "third detail ".to_string(),
        ]);
    }

    #[test]
    fn test_round_trip_to_report_json() {
        let lines = [
            "1/2 Test #1: unit_add ......................   Passed    0.01 sec",
            "2/2 Test #2: unit_sub ......................***Failed  assertion mismatch at line 10",
        ];
        let transcript = Transcript::parse(lines.iter()).unwrap();
        let report = Report::project(&transcript, PACKAGE, CLASS).unwrap();

        let expected: serde_json::Value = serde_json::from_str(
            r#"{"data":[
                {"packageName":"lesson","methodName":"add","tags":["unit"],
                 "results":[{"status":"SUCCESSFUL","failure":null}]},
                {"packageName":"lesson","methodName":"sub","tags":["unit"],
                 "results":[{"status":"FAILED","failure":{
                    "@class":"org.jetbrains.research.runner.data.UnknownFailureDatum",
                    "nestedException":"assertion mismatch at line 10 "}}]}
            ]}"#,
        )
        .unwrap();
        assert_that!(serde_json::to_value(&report).unwrap()).is_equal_to(expected);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let t = Transcript {
            outcomes: vec![
                outcome(1, "unit_add", true, None),
                outcome(2, "unit_sub", false, Some("assertion mismatch at line 10 ")),
            ],
        };
        let first = Report::project(&t, PACKAGE, CLASS).unwrap().to_json().unwrap();
        let second = Report::project(&t, PACKAGE, CLASS).unwrap().to_json().unwrap();
        assert_that!(first.as_str()).is_equal_to(second.as_str());
    }

    #[test]
    fn test_write_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let t = Transcript {
            outcomes: vec![outcome(1, "unit_add", true, None)],
        };
        let report = Report::project(&t, PACKAGE, CLASS).unwrap();
        report.write(path.to_str().unwrap()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let read_back: Report = serde_json::from_str(&contents).unwrap();
        assert_that!(&read_back).is_equal_to(&report);
    }
}
