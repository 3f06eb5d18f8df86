mod chat;
mod error;
mod loader;
mod template;

pub use self::{
    chat::ChatPromptTemplate,
    error::TemplateError,
    loader::{cached_prompt_template, load_prompt_template},
    template::PromptTemplate,
};
