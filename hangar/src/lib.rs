//! Hangar - Godot engine version and project management
//!
//! This library provides the core functionality behind the `hangar` CLI:
//! keeping a catalog of known Godot releases, downloading and installing
//! engine builds, tracking which projects are bound to which engine
//! version, and launching the right editor binary for a project.
//!
//! The main entry points are:
//! - [`catalog::Catalog`] - the table of known engine releases
//! - [`store::InstallationStore`] - durable install and project state
//! - [`manager::EngineManager`] - download/install/launch orchestration

pub mod catalog;
pub mod manager;
pub mod platform;
pub mod project;
pub mod store;

pub use catalog::{Catalog, EngineRelease};
pub use manager::{
    EngineListing, EngineManager, ManagerError, ManagerResult, PipelineHandle, PipelinePhase,
};
pub use project::Project;
pub use store::{InstallationStore, SharedStore};
