//! Scripted process runner for tests and dry runs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rigger_core::application::ports::ProcessRunner;

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Whether the argv contains `word` as a whole argument.
    pub fn has_arg(&self, word: &str) -> bool {
        self.argv.iter().any(|a| a == word)
    }
}

#[derive(Debug, Clone)]
struct Rule {
    prefix: Vec<String>,
    /// Failures to report before succeeding; `None` never succeeds.
    failures_left: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    calls: Vec<Invocation>,
}

/// Answers by argv-prefix rules and records every invocation.
///
/// The first rule whose prefix matches decides; unmatched commands get the
/// default answer. Clones share state.
#[derive(Debug, Clone)]
pub struct ScriptedProcessRunner {
    state: Arc<Mutex<State>>,
    default: bool,
}

impl ScriptedProcessRunner {
    /// Every command succeeds unless a rule says otherwise.
    pub fn succeeding() -> Self {
        Self::with_default(true)
    }

    /// Every command fails unless a rule says otherwise.
    pub fn failing() -> Self {
        Self::with_default(false)
    }

    fn with_default(default: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            default,
        }
    }

    /// Commands starting with `prefix` always fail.
    pub fn fail_on(self, prefix: &[&str]) -> Self {
        self.push_rule(prefix, None)
    }

    /// Commands starting with `prefix` always succeed.
    pub fn succeed_on(self, prefix: &[&str]) -> Self {
        self.push_rule(prefix, Some(0))
    }

    /// Commands starting with `prefix` fail `failures` times, then succeed.
    pub fn succeed_after(self, prefix: &[&str], failures: u32) -> Self {
        self.push_rule(prefix, Some(failures))
    }

    fn push_rule(self, prefix: &[&str], failures_left: Option<u32>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.rules.push(Rule {
                prefix: prefix.iter().map(|p| p.to_string()).collect(),
                failures_left,
            });
        }
        self
    }

    /// Every invocation so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// Invocations containing `word` as an argument.
    pub fn calls_with(&self, word: &str) -> Vec<Invocation> {
        self.calls().into_iter().filter(|c| c.has_arg(word)).collect()
    }
}

impl ProcessRunner for ScriptedProcessRunner {
    fn succeeds(&self, argv: &[String], working_dir: &Path, timeout: Option<Duration>) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };

        state.calls.push(Invocation {
            argv: argv.to_vec(),
            working_dir: working_dir.to_path_buf(),
            timeout,
        });

        let rule = state
            .rules
            .iter_mut()
            .find(|rule| argv.starts_with(&rule.prefix));

        match rule {
            None => self.default,
            Some(Rule {
                failures_left: None,
                ..
            }) => false,
            Some(Rule {
                failures_left: Some(0),
                ..
            }) => true,
            Some(Rule {
                failures_left: Some(n),
                ..
            }) => {
                *n -= 1;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn first_matching_rule_wins() {
        let runner = ScriptedProcessRunner::succeeding()
            .fail_on(&["docker", "compose", "up"])
            .succeed_on(&["docker"]);

        let dir = Path::new("/p");
        assert!(!runner.succeeds(&argv(&["docker", "compose", "up", "-d", "redis"]), dir, None));
        assert!(runner.succeeds(&argv(&["docker", "ps"]), dir, None));
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn succeed_after_counts_down() {
        let runner = ScriptedProcessRunner::failing().succeed_after(&["probe"], 2);
        let dir = Path::new("/p");
        let results: Vec<bool> = (0..4)
            .map(|_| runner.succeeds(&argv(&["probe"]), dir, None))
            .collect();
        assert_eq!(results, [false, false, true, true]);
    }

    #[test]
    fn records_timeouts() {
        let runner = ScriptedProcessRunner::succeeding();
        runner.succeeds(
            &argv(&["docker", "compose", "exec", "-T", "redis", "echo", "ready"]),
            Path::new("/p"),
            Some(Duration::from_secs(2)),
        );

        let calls = runner.calls_with("exec");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].timeout, Some(Duration::from_secs(2)));
    }
}
