//! Taskdeck API - authenticated access to the task service
//!
//! [`AuthenticatedClient`] owns token attachment and session teardown;
//! [`ResourceApi`] exposes the workspace / space / list / task reads on top
//! of it.

pub mod client;
pub mod resources;

pub use client::{AuthenticatedClient, QueryParams};
pub use resources::{OrderBy, ResourceApi, TaskQuery};
