// SPDX-License-Identifier: MIT

//! Workflow step-tree tooling for Suna agents
//!
//! Converts workflow steps between the builder's editable tree, the
//! backend's nested and legacy flat wire formats, and the plan format handed
//! to the agent's model; and drives load/edit/save sessions against the
//! backend API.

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod workflow;

pub use error::{SunaError, WorkflowError};
