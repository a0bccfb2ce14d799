// Library interface for linkbrief modules
// This allows tests and the binary to import modules

pub mod links;
pub mod llm;
pub mod pipeline;
pub mod preferences;
pub mod prompt;
pub mod scraping;
pub mod telegram;
