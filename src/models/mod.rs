//! Domain models shared by the migration stages.

mod attachment;
mod enumeration;
mod project;
mod tree;
mod user;

pub use attachment::{disk_filename, file_extension, DEFAULT_EXTENSION};
pub use enumeration::EnumDomain;
pub use project::{project_identifier, ProjectIdentifiers, ProjectStatus};
pub use tree::TreePosition;
pub use user::{hash_password, PersonName, UserStatus};
