pub mod memory;

pub use memory::{RegistryMetadata, TemplateRegistry};
