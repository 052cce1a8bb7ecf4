// Cover letter generation: prompt assembly, the model call, and the HTTP endpoint.
// All model calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
