//! AI adapter module. Implements SuggestionPort for LLM integration.
//!
//! OpenAI-compatible adapter plus offline and mock fallbacks.

pub mod mock_adapter;
pub mod offline_adapter;
pub mod openai_adapter;

pub use mock_adapter::MockSuggestionAdapter;
pub use offline_adapter::OfflineSuggestionAdapter;
pub use openai_adapter::OpenAiAdapter;
