// Parsing of the ctest transcript into per-test outcomes.

use crate::error::Error;

/// Substring announcing a test-result line, followed by the ordinal.
const RESULT_MARKER: &str = "Test #";

/// Status word ctest prints for a passing test.
const STATUS_PASSED: &str = "Passed";

/// Whitespace-token index of the raw test name on a result line.
const TOKEN_NAME: usize = 3;

/// Whitespace-token index at which free-text failure detail starts.
const TOKEN_DETAIL: usize = 5;

/// Outcome of a single executed test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// 1-based sequence number assigned by the runner, in recognition order.
    pub ordinal: usize,

    /// Raw test identifier as printed by the runner.
    pub name: String,

    /// Whether the test passed.
    pub passed: bool,

    /// Free-text diagnostic captured for a failed test. `None` iff `passed`.
    pub failure: Option<String>,
}

/// All recognized outcomes of one test run, in first-insertion order.
///
/// Outcomes are keyed by raw name: a later result line for an already-seen
/// name replaces the earlier entry in place, keeping its position (latest
/// status wins). Well-formed transcripts never repeat a name.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub outcomes: Vec<TestOutcome>,
}

impl Transcript {
    /// Reads and parses the transcript file at `path`.
    pub fn load(path: &str) -> Result<Self, Error> {
        log::debug!("Reading transcript from {path}");
        let contents: String = std::fs::read_to_string(path)
            .inspect_err(|e| log::error!("Could not read transcript \"{path}\": {e}"))?;
        Self::parse(contents.lines())
    }

    /// Parses an ordered sequence of transcript lines.
    ///
    /// Each executed test is announced on one result line with a rigid
    /// column layout (as written by `ctest -O`):
    ///
    /// ```text
    /// <i/n> Test #<N>: <name> <dot leader + status> [detail tokens...]
    /// 1/2 Test #1: unit_add ...................   Passed    0.01 sec
    /// 2/2 Test #2: unit_sub ...................***Failed  assertion mismatch at line 10
    /// ```
    ///
    /// Whitespace-tokenized, the raw test name is token 3, and free-text
    /// failure detail starts at token 5 (for failures ctest fuses the status
    /// word into the dot leader, which is token 4). A line passes iff it
    /// contains the literal `Passed`; any other status word counts as a
    /// failure and the detail tokens are captured, each with a trailing
    /// space.
    ///
    /// The runner numbers tests sequentially from 1, so only lines
    /// announcing the currently expected ordinal are recognized; anything
    /// else is noise such as start or summary lines and is skipped. A
    /// transcript that stops early yields the recognized prefix.
    ///
    /// A recognized line with no name column violates the format contract
    /// and aborts parsing with `Error::TranscriptFormatError`.
    pub fn parse<S: AsRef<str>, I: IntoIterator<Item = S>>(lines: I) -> Result<Self, Error> {
        let mut transcript = Transcript::default();
        let mut expected_ordinal: usize = 1;

        for line in lines {
            let line = line.as_ref();
            if !line.contains(&format!("{RESULT_MARKER}{expected_ordinal}")) {
                if line.contains(RESULT_MARKER) {
                    log::debug!("Skipping out-of-sequence result line: {line}");
                }
                continue;
            }

            let ordinal = expected_ordinal;
            expected_ordinal += 1;

            let words: Vec<&str> = line.split_whitespace().collect();
            let name = words.get(TOKEN_NAME).copied().ok_or_else(|| {
                log::error!("Result line for test #{ordinal} has no name column: {line}");
                Error::TranscriptFormatError(format!(
                    "result line for test #{ordinal} has too few columns"
                ))
            })?;

            let passed = line.contains(STATUS_PASSED);
            let failure = if passed {
                None
            } else {
                Some(
                    words
                        .get(TOKEN_DETAIL..)
                        .unwrap_or(&[])
                        .iter()
                        .map(|w| format!("{w} "))
                        .collect::<String>(),
                )
            };

            transcript.record(TestOutcome {
                ordinal: ordinal,
                name: name.to_string(),
                passed: passed,
                failure: failure,
            });
        }

        log::info!("Recognized {} test results", transcript.outcomes.len());
        Ok(transcript)
    }

    /// Records an outcome, overwriting any earlier outcome with the same
    /// name in place.
    fn record(&mut self, outcome: TestOutcome) {
        match self.outcomes.iter_mut().find(|o| o.name == outcome.name) {
            Some(existing) => *existing = outcome,
            None => self.outcomes.push(outcome),
        }
    }
}
