pub mod ai_utils;
pub mod chapter;
pub mod config;
pub mod error;
pub mod flashcard;
pub mod history;
pub mod parser;
pub mod prompts;
pub mod quiz;
pub mod summary;
pub mod utils;
