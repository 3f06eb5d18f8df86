use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: String) -> Self {
        Self { role, content: Some(content) }
    }

    pub fn system<T: Into<String>>(content: T) -> Self { Self::new(Role::System, content.into()) }
    pub fn user<T: Into<String>>(content: T) -> Self { Self::new(Role::User, content.into()) }
    pub fn assistant<T: Into<String>>(content: T) -> Self { Self::new(Role::Assistant, content.into()) }

    /// Message text, or an empty string when the model sent none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

#[derive(Serialize, Debug, Clone, Default, Deserialize)]
pub struct BaseRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<InferenceOptions>,
}

/// Sampling options shared by every provider.
///
/// Providers map the fields they understand and drop the rest.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InferenceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl InferenceOptions {
    /// Returns a copy with `stop` extended by the given sequences.
    pub fn with_stop<I, S>(&self, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = self.clone();
        let stop = out.stop.get_or_insert_with(Vec::new);
        for s in sequences {
            let s = s.into();
            if !stop.contains(&s) {
                stop.push(s);
            }
        }
        out
    }
}
