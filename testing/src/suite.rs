//! Suite-level setup and teardown around a sequence of test cases.
//!
//! libtest has no hook that runs once before and once after a group of
//! tests, so a suite is driven from a single `#[tokio::test]`:
//!
//! ```rust,no_run
//! use futures_util::future::BoxFuture;
//! use testing::suite::{Suite, SuiteRunner};
//!
//! struct Empty;
//!
//! #[async_trait::async_trait]
//! impl Suite for Empty {
//!     async fn setup_suite(&mut self) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     async fn teardown_suite(&mut self) -> Vec<anyhow::Error> {
//!         Vec::new()
//!     }
//! }
//!
//! fn trivial(_: &mut Empty) -> BoxFuture<'_, anyhow::Result<()>> {
//!     Box::pin(async { Ok(()) })
//! }
//!
//! # async fn run() {
//! let report = SuiteRunner::new("Empty")
//!     .case("trivial", trivial)
//!     .run(&mut Empty)
//!     .await
//!     .unwrap();
//! report.assert_passed();
//! # }
//! ```

use async_trait::async_trait;
use errors::SuiteError;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

#[async_trait]
pub trait Suite: Send {
    /// Runs once before any case. An error aborts the suite.
    async fn setup_suite(&mut self) -> anyhow::Result<()>;

    /// Runs once after all cases, and after a failed setup. Every cleanup
    /// step should run; each failure is returned.
    async fn teardown_suite(&mut self) -> Vec<anyhow::Error>;
}

pub type CaseFn<S> = for<'a> fn(&'a mut S) -> BoxFuture<'a, anyhow::Result<()>>;

pub struct Case<S> {
    name: String,
    run: CaseFn<S>
}

#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub name: String,
    pub duration: Duration,
    pub error: Option<String>
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub suite: String,
    pub cases: Vec<CaseOutcome>,
    pub teardown_failures: Vec<String>
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.teardown_failures.is_empty() && self.cases.iter().all(CaseOutcome::passed)
    }

    pub fn failed_cases(&self) -> Vec<&CaseOutcome> {
        self.cases.iter().filter(|c| !c.passed()).collect()
    }

    /// Panics with every case and teardown failure listed.
    pub fn assert_passed(&self) {
        if self.passed() {
            return;
        }

        let mut summary = format!("suite {} failed:", self.suite);
        for case in self.failed_cases() {
            summary.push_str(&format!(
                "\n  case {}: {}",
                case.name,
                case.error.as_deref().unwrap_or_default()
            ));
        }
        for failure in &self.teardown_failures {
            summary.push_str(&format!("\n  teardown: {}", failure));
        }
        panic!("{}", summary);
    }
}

pub struct SuiteRunner<S> {
    name: String,
    cases: Vec<Case<S>>
}

impl<S: Suite> SuiteRunner<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new()
        }
    }

    /// Registers a case; cases run in registration order.
    pub fn case(mut self, name: impl Into<String>, run: CaseFn<S>) -> Self {
        self.cases.push(Case {
            name: name.into(),
            run
        });
        self
    }

    pub async fn run(&self, suite: &mut S) -> Result<SuiteReport, SuiteError> {
        tracing::info!(suite = %self.name, cases = self.cases.len(), "Setting up suite");

        if let Err(e) = suite.setup_suite().await {
            let reason = format!("{:#}", e);
            tracing::error!(suite = %self.name, error = %reason, "Suite setup failed");
            let mut cleanup_failures = Vec::new();
            for failure in suite.teardown_suite().await {
                let failure = format!("{:#}", failure);
                tracing::warn!(suite = %self.name, error = %failure, "Cleanup after failed setup");
                cleanup_failures.push(failure);
            }
            return Err(SuiteError::Setup {
                suite: self.name.clone(),
                reason,
                cleanup_failures
            });
        }

        let mut outcomes = Vec::with_capacity(self.cases.len());
        for case in &self.cases {
            let started = Instant::now();
            let result = AssertUnwindSafe((case.run)(&mut *suite)).catch_unwind().await;
            let error = match result {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{:#}", e)),
                Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref())))
            };

            match &error {
                None => tracing::info!(suite = %self.name, case = %case.name, "Case passed"),
                Some(e) => {
                    tracing::error!(suite = %self.name, case = %case.name, error = %e, "Case failed")
                }
            }

            outcomes.push(CaseOutcome {
                name: case.name.clone(),
                duration: started.elapsed(),
                error
            });
        }

        let teardown_failures: Vec<String> = suite
            .teardown_suite()
            .await
            .into_iter()
            .map(|e| format!("{:#}", e))
            .collect();
        for failure in &teardown_failures {
            tracing::error!(suite = %self.name, error = %failure, "Teardown failed");
        }

        Ok(SuiteReport {
            suite: self.name.clone(),
            cases: outcomes,
            teardown_failures
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
