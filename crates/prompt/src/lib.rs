//! Prompt system for casefile.
//!
//! Every LLM call in the investigation pipeline goes through a YAML prompt
//! definition rendered with Handlebars. Built-in definitions ship with the
//! binary and can be overridden per workspace.

pub mod builder;
pub mod builtin;
pub mod library;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use library::PromptLibrary;
pub use loader::{list_prompts, load_builtin, load_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec, PromptSampling,
};
