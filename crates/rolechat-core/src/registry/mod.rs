//! Persona registries.

mod persona;

pub use persona::StaticPersonaRegistry;
