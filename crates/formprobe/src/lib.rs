//! formprobe: Cross-Engine Acceptance Checks for a Registration Form
//!
//! Drives a web registration form through a fixed catalog of scenarios on
//! Chromium, Gecko and WebKit, and reports which engine rejected what.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FORMPROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Registra-  │    │ Locator /  │            │
//! │   │ catalog    │───►│ tionPage   │───►│ expect     │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │         ▲                                   ▼                   │
//! │   ┌─────┴──────┐                      ┌────────────┐            │
//! │   │ Suite      │─── one context ─────►│ Driver     │            │
//! │   │ runner     │    per attempt       │ CDP / WD   │            │
//! │   └─────┬──────┘                      └────────────┘            │
//! │         ▼                                                       │
//! │   report.html · results.json · junit.xml · artifacts/           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use formprobe::{catalog, CancellationSignal, Engine, SuiteConfig, SuiteRunner};
//!
//! let runner = SuiteRunner::new(SuiteConfig::default());
//! let report = runner
//!     .run(&Engine::ALL, &catalog(), CancellationSignal::never())
//!     .await;
//! report.write(&runner.config().output_dir).await?;
//! assert!(report.exit_ok());
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod artifacts;
pub mod browser;
pub mod config;
pub mod driver;
pub mod expect;
pub mod form;
pub mod locator;
pub mod media;
pub mod page;
pub mod page_object;
pub mod registration;
pub mod reporter;
pub mod result;
pub mod runner;
pub mod scenario;
pub mod script;
pub mod text;
pub mod wait;

pub use artifacts::{ArtifactPaths, Journal, StepRecord, StepStatus, TraceFile};
pub use browser::{BrowserEngine, Launcher, NativeLauncher};
pub use config::{Engine, SuiteConfig, Timeouts};
pub use driver::{Action, Driver, ElementState, MockDriver};
pub use expect::{expect, expect_url, Expect, Predicate};
pub use form::FormInput;
pub use locator::{Locator, Readiness, Role, Selector};
pub use page::Page;
pub use page_object::PageObject;
pub use registration::{messages, RegistrationPage};
pub use reporter::{ScenarioReport, ScenarioStatus, SuiteReport};
pub use result::{ProbeError, ProbeResult};
pub use runner::{CancellationHandle, CancellationSignal, RunObserver, SuiteRunner};
pub use scenario::{catalog, filter, Outcome, Scenario};
pub use wait::{poll_until, Probe, WaitOptions};
