mod chat;
mod template;

pub use chat::{ChatPromptTemplate, RenderedPrompt};
pub use template::PromptTemplate;
