//! wizcheck Common Library
//!
//! The wizard-flow model shared by the harness crates: page nodes and their
//! contracts, the navigation graph, literal scenarios, per-run flow state,
//! and the built-in holiday-entitlement catalog.

pub mod catalog;
pub mod error;
pub mod flow;
pub mod graph;
pub mod model;
pub mod scenario;
pub mod types;

// Re-export commonly used types
pub use error::{GraphError, ModelError, Result};
pub use flow::FlowState;
pub use graph::{GraphDefect, NavigationGraph};
pub use model::{Wizard, WizardModel};
pub use scenario::{NegativePolicy, Scenario, ScenarioStatus, ScenarioStep};
pub use types::*;
