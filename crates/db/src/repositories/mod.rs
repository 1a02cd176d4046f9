//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Every caller-supplied value is
//! bound as a query parameter.

pub mod instruction_repo;
pub mod job_group_repo;
pub mod job_repo;
pub mod tenant_variable_repo;

pub use instruction_repo::InstructionRepo;
pub use job_group_repo::JobGroupRepo;
pub use job_repo::JobRepo;
pub use tenant_variable_repo::TenantVariableRepo;
