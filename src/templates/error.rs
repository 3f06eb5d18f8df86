use std::path::PathBuf;

/// Errors raised while loading or rendering a prompt template.
#[derive(Debug)]
pub enum TemplateError {
    /// The template file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// A brace was opened or closed without a matching partner.
    Malformed(String),
    /// A placeholder had no value at render time.
    MissingVariable(String),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Io { path, source } => {
                write!(f, "Could not read prompt template {}: {source}", path.display())
            }
            TemplateError::Malformed(s) => write!(f, "Malformed prompt template: {s}"),
            TemplateError::MissingVariable(name) => {
                write!(f, "Missing value for template variable '{name}'")
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
