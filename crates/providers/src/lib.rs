pub mod google;
pub mod openai_compat;
pub mod registry;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use registry::build_client;
pub use traits::{GenerateRequest, GenerateResponse, InferenceClient, Usage};
