//! Pipeline assembly: a registry of pluggable components, a constructor
//! resolver for declarative specs, and the assembler that wires a
//! read → parse → enrich chain out of them.

pub mod args;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use args::{bind, spec_parts, ArgPayload, BoundArgs};
pub use error::AssemblyError;
pub use pipeline::{Overrides, Pipeline, PipelineConfig};
pub use registry::{Component, ComponentEntry, ComponentKind, Registry, SpecOr};
