//! Orchestration crate: everything needed to drive a real browser through
//! the case matrix and produce a run artifact. Splits the teacher's single
//! `chromium_compare` test-support module into discrete, independently
//! testable pieces — one per concern the spec names as its own component
//! (C6-C9) — instead of one large fixture-runner file.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod document;
pub mod engine;
pub mod network_guard;
pub mod page_controller;
pub mod scheduler;

pub use artifact::{OutcomeTally, RunArtifact};
pub use config::RunConfig;
pub use engine::{EngineKind, LaunchedBrowser};
pub use page_controller::{PageController, PageRunOutcome, TimeoutBudget};
pub use scheduler::{expand_case_matrix, run_engine, Timestamp};
