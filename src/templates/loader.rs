use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock},
};

use tracing::debug;

use super::TemplateError;

/// Read a prompt template file verbatim.
pub fn load_prompt_template<P: AsRef<Path>>(path: P) -> Result<String, TemplateError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "loaded prompt template");
    Ok(text)
}

fn cache() -> &'static Mutex<HashMap<PathBuf, Arc<str>>> {
    static CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<str>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Like [`load_prompt_template`], but each path is read at most once per
/// process. Failed reads are not cached.
pub fn cached_prompt_template<P: AsRef<Path>>(path: P) -> Result<Arc<str>, TemplateError> {
    let path = path.as_ref();
    let mut guard = cache().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(hit) = guard.get(path) {
        return Ok(hit.clone());
    }
    let text: Arc<str> = load_prompt_template(path)?.into();
    guard.insert(path.to_path_buf(), text.clone());
    Ok(text)
}
