//! Document side of the sizer
//!
//! - **host**: the collaborator trait a document implements
//! - **memory**: in-memory document model
//! - **engine**: preview/commit application of the sizing state

pub mod engine;
pub mod host;
pub mod memory;

pub use engine::{format_px, ApplicationEngine, ApplyMode};
pub use host::{StyleHost, StyleProperty, Target, WriteCondition};
pub use memory::{Element, ElementId, MemoryDocument};
