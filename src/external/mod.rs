pub mod gemini;
pub mod llm_provider;
