//! Constraint classification and resolution.

pub mod handler;
pub mod resolve;

pub use handler::{Classification, Handler, classify, lookup};
pub use resolve::{
    AgentIr, ConstraintIssue, Preflight, ResolvedConstraint, ResolvedTree, preflight, resolve,
};
