//! Optional code-quality checks the verifier can fold into confidence.
//!
//! Real typecheckers/test-runners are external collaborators this crate
//! does not ship; a [`CodeCheck`] is invoked as an injected closure
//! rather than by spawning a subprocess, so callers can plug one in
//! without this crate knowing how to build or launch it.

/// Outcome of running one [`CodeCheck`].
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Name of the check that produced this outcome.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Human-readable detail, especially on failure.
    pub message: String,
}

/// A single code-quality check (typecheck, test run, impact scan, ...).
pub trait CodeCheck: Send + Sync {
    /// Short, stable name for this check.
    fn name(&self) -> &str;

    /// Runs the check and reports its outcome.
    fn run(&self) -> CheckOutcome;
}

/// A check backed by an arbitrary closure, for callers who don't need a
/// dedicated type.
pub struct ClosureCheck<F> {
    name: String,
    check: F,
}

impl<F> ClosureCheck<F>
where
    F: Fn() -> (bool, String) + Send + Sync,
{
    /// Wraps `check` as a named [`CodeCheck`].
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self { name: name.into(), check }
    }
}

impl<F> CodeCheck for ClosureCheck<F>
where
    F: Fn() -> (bool, String) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> CheckOutcome {
        let (passed, message) = (self.check)();
        CheckOutcome { name: self.name.clone(), passed, message }
    }
}

/// A check that always passes; the reference implementation used when
/// no real checker is configured.
pub struct NoOpCheck;

impl CodeCheck for NoOpCheck {
    fn name(&self) -> &str {
        "noop"
    }

    fn run(&self) -> CheckOutcome {
        CheckOutcome { name: self.name().to_string(), passed: true, message: "no check configured".to_string() }
    }
}

/// Runs every check in `checks` and returns their outcomes.
#[must_use]
pub fn run_all(checks: &[Box<dyn CodeCheck>]) -> Vec<CheckOutcome> {
    checks.iter().map(|c| c.run()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_check_always_passes() {
        let outcome = NoOpCheck.run();
        assert!(outcome.passed);
    }

    #[test]
    fn closure_check_reports_failure() {
        let check = ClosureCheck::new("always_fails", || (false, "boom".to_string()));
        let outcome = check.run();
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "boom");
    }

    #[test]
    fn run_all_collects_every_outcome() {
        let checks: Vec<Box<dyn CodeCheck>> = vec![Box::new(NoOpCheck), Box::new(ClosureCheck::new("fail", || (false, "x".into())))];
        let outcomes = run_all(&checks);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].passed);
        assert!(!outcomes[1].passed);
    }
}
