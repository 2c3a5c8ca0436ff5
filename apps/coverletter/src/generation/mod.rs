// Cover-letter generation: source extraction, prompting, filename
// derivation and the end-to-end pipeline.
// All LLM calls go through llm_client; no direct OpenAI calls here.

pub mod extract;
pub mod filename;
pub mod generator;
pub mod pipeline;
pub mod prompts;
