//! Row structs for the catalog tables.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! table row, plus any input DTOs the repositories accept.

pub mod instruction;
pub mod job;
pub mod job_group;
pub mod tenant_variable;
