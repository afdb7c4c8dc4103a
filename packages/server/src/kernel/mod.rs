// Kernel - infrastructure implementations of external collaborators
//
// Business logic (what to generate, how to meter it) lives in domains.
// This module only provides infrastructure: the dependency container,
// the collaborator traits, and their production/test implementations.

pub mod deps;
pub mod generation;
pub mod storefront;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use generation::OpenAiGenerator;
pub use storefront::AdminGateway;
pub use traits::{ContentGenerator, StorefrontGateway};
