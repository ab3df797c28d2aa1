//! Trellis Graph — parameterized Cypher statements from typed graph entities.
//!
//! Nodes, relationships, and paths serialize themselves into pattern text
//! plus parameters; property references produce comparison leaves that
//! compose into boolean expressions; a `Statement` strings clauses together
//! and hands `(text, params)` to the Neo4j client for execution.

pub mod client;
pub mod expression;
pub mod pattern;
pub mod property;
pub mod statement;

pub use client::{AccessMode, GraphClient, GraphConfig, GraphError, Job};
pub use expression::{not, Expression, Invertible, Operator};
pub use pattern::{Destination, Direction, HasProperties, Node, Path, Pattern, Relationship};
pub use property::Property;
pub use statement::Statement;
pub use trellis_core::{ParamMap, Value};
