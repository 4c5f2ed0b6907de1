//! wizcheck conformance runner
//!
//! Drives a browser session through a wizard model and checks each page
//! against its contract:
//! - Element Accessor trait, with an in-memory simulated site and a
//!   headless Chrome implementation (feature `chromium`)
//! - Page Node driver and Validation Oracle
//! - Scenario Runner with bounded concurrency across sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ScenarioRunner                           │
//! │    ├── run(scenario, accessor) -> ScenarioReport            │
//! │    ├── run_suite(factory, scenarios, n) -> SuiteReport      │
//! │    └── reach(scenario, node, accessor) -> FlowState         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Oracle                                                     │
//! │    ├── check_positive(node) -> [Violation]                  │
//! │    ├── check_negative(node, case) -> Option<Violation>      │
//! │    └── verify_idempotence(node) -> IdempotenceReport        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  NodeDriver (render_contract, submit, clear_fields)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ElementAccessor: SimulatedSite | ChromiumSession           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod accessor;
#[cfg(feature = "chromium")]
pub mod chromium;
pub mod config;
pub mod error;
pub mod oracle;
pub mod page;
pub mod report;
pub mod runner;
pub mod simulated;
pub mod wait;

pub use accessor::{ElementAccessor, SessionFactory};
pub use config::HarnessConfig;
pub use error::{E2eError, E2eResult};
pub use oracle::{CaseVerdict, Oracle, Violation, ViolationKind};
pub use page::{Assertion, Mismatch, NodeContract, NodeDriver};
pub use report::{Outcome, ScenarioReport, SuiteReport};
pub use runner::{AbortReason, RunState, ScenarioRunner};
pub use simulated::{Fault, PageKey, SimulatedFactory, SimulatedSite};
pub use wait::WaitPolicy;
