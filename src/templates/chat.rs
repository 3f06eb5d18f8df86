use std::collections::HashMap;

use crate::services::llm::models::base::{Message, Role};

use super::{PromptTemplate, TemplateError};

/// A list of role-tagged prompt templates rendered into chat messages.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    messages: Vec<(Role, PromptTemplate)>,
}

impl ChatPromptTemplate {
    /// A chat prompt made of a single user message.
    pub fn from_template<T>(template: T) -> Result<Self, TemplateError>
    where
        T: Into<String>,
    {
        Ok(Self {
            messages: vec![(Role::User, PromptTemplate::from_template(template)?)],
        })
    }

    pub fn from_messages<I, T>(messages: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (Role, T)>,
        T: Into<String>,
    {
        let messages = messages
            .into_iter()
            .map(|(role, text)| Ok((role, PromptTemplate::from_template(text)?)))
            .collect::<Result<Vec<_>, TemplateError>>()?;
        Ok(Self { messages })
    }

    pub fn input_variables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (_, t) in &self.messages {
            for v in t.input_variables() {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        out
    }

    pub fn format_messages<K, V>(&self, values: &HashMap<K, V>) -> Result<Vec<Message>, TemplateError>
    where
        K: AsRef<str> + Eq + std::hash::Hash,
        V: AsRef<str>,
    {
        self.messages
            .iter()
            .map(|(role, t)| Ok(Message::new(role.clone(), t.format(values)?)))
            .collect()
    }
}
