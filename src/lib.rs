//! # Assessment Navigator
//!
//! A navigation engine for step-by-step assessments and surveys. An
//! assessment is a tree of nodes; the engine walks it one presented node at
//! a time, applies skip rules to answers, tracks a result tree and tells the
//! host when to start or stop background actions.
//!
//! ## Features
//!
//! - **Node Tree**: instructions, questions, forms, sections and host defined nodes
//! - **Survey Rules**: answer based jumps with numeric tolerance and rounding
//! - **Result Tree**: per-container collections with path and revisit history
//! - **Node State Machine**: forward, backward and early exit driven from the root
//! - **Background Actions**: start/stop sets computed for every move
//! - **Resource Decoding**: JSON trees with imports and a node type registry
//!
//! ## Architecture
//!
//! ```text
//! JSON resources → decode (FileLoader, NodeRegistry) → Node tree
//!                                                        ↓
//!          RootNodeController ← BranchNodeState → Navigator
//!                                                        ↓
//!                                                  Result tree
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use assessment_navigator::{decode, runner, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let loader = decode::DirectoryFileLoader::new("assessments");
//!     let node = decode::unpack(
//!         &loader,
//!         &decode::ResourceInfo::new("survey"),
//!         &decode::NodeRegistry::new(),
//!     )?;
//!     let report = runner::run_scripted(node, &BTreeMap::new(), &config.navigation, 500)?;
//!     println!("{}", serde_json::to_string_pretty(&report.result)?);
//!     Ok(())
//! }
//! ```

/// Configuration loaded from the environment.
pub mod config;
/// Decoding node trees from JSON resources.
pub mod decode;
/// Error types and result aliases for the application.
pub mod error;
/// The node tree.
pub mod model;
/// Navigators, node states and host callbacks.
pub mod navigation;
/// The result tree.
pub mod results;
/// Scripted session runner.
pub mod runner;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use model::Node;
pub use navigation::{BranchNodeState, FinishedReason, RootNodeController};
pub use results::{BranchNodeResult, ResultData};
