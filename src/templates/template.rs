use std::collections::HashMap;

use super::TemplateError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A text template with `{name}` placeholders.
///
/// `{{` and `}}` render as literal braces. Variables are collected in the
/// order they first appear. Values bound with [`PromptTemplate::partial`]
/// are used when a render call does not provide the same key.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    segments: Vec<Segment>,
    variables: Vec<String>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    pub fn from_template<T>(template: T) -> Result<Self, TemplateError>
    where
        T: Into<String>,
    {
        let template = template.into();
        let segments = parse(&template)?;

        let mut variables: Vec<String> = Vec::new();
        for seg in &segments {
            if let Segment::Variable(name) = seg {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
            }
        }

        Ok(Self {
            template,
            segments,
            variables,
            partials: HashMap::new(),
        })
    }

    /// The raw template text, exactly as it was supplied.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Variables that still need a value at render time.
    pub fn input_variables(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| !self.partials.contains_key(*v))
            .map(String::as_str)
            .collect()
    }

    /// Every placeholder named in the template, partials included.
    pub fn all_variables(&self) -> &[String] {
        &self.variables
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }

    /// Bind a value ahead of time.
    pub fn partial<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.partials.insert(name.into(), value.into());
        self
    }

    pub fn format<K, V>(&self, values: &HashMap<K, V>) -> Result<String, TemplateError>
    where
        K: AsRef<str> + Eq + std::hash::Hash,
        V: AsRef<str>,
    {
        let lookup: HashMap<&str, &str> = values
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();

        let mut out = String::with_capacity(self.template.len());
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = lookup
                        .get(name.as_str())
                        .copied()
                        .or_else(|| self.partials.get(name).map(String::as_str))
                        .ok_or_else(|| TemplateError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    match n {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(TemplateError::Malformed(format!(
                                "nested '{{' in placeholder starting at byte {pos}"
                            )))
                        }
                        other => name.push(other),
                    }
                }
                if !closed {
                    return Err(TemplateError::Malformed(format!(
                        "unclosed '{{' at byte {pos}"
                    )));
                }
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TemplateError::Malformed(format!(
                        "empty placeholder at byte {pos}"
                    )));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name));
            }
            '}' => {
                return Err(TemplateError::Malformed(format!(
                    "single '}}' at byte {pos}"
                )))
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_in_first_appearance_order() {
        let t = PromptTemplate::from_template("{b} then {a} then {b} again").unwrap();
        assert_eq!(t.input_variables(), vec!["b", "a"]);
    }

    #[test]
    fn format_substitutes_and_unescapes() {
        let t = PromptTemplate::from_template("Q: {question} {{literal}}").unwrap();
        let mut vars = HashMap::new();
        vars.insert("question", "why?");
        assert_eq!(t.format(&vars).unwrap(), "Q: why? {literal}");
    }

    #[test]
    fn missing_variable_is_an_error() {
        let t = PromptTemplate::from_template("Hello {name}").unwrap();
        let vars: HashMap<&str, &str> = HashMap::new();
        let err = t.format(&vars).unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariable(ref n) if n == "name"));
    }

    #[test]
    fn extra_variables_are_ignored() {
        let t = PromptTemplate::from_template("Hi {name}").unwrap();
        let mut vars = HashMap::new();
        vars.insert("name", "Ana");
        vars.insert("unused", "x");
        assert_eq!(t.format(&vars).unwrap(), "Hi Ana");
    }

    #[test]
    fn partials_fill_gaps_but_explicit_values_win() {
        let t = PromptTemplate::from_template("{greeting}, {name}")
            .unwrap()
            .partial("greeting", "Hello")
            .partial("name", "nobody");
        assert_eq!(t.input_variables(), Vec::<&str>::new());

        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Koper".to_string());
        assert_eq!(t.format(&vars).unwrap(), "Hello, Koper");
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!(matches!(
            PromptTemplate::from_template("oops {name"),
            Err(TemplateError::Malformed(_))
        ));
        assert!(matches!(
            PromptTemplate::from_template("oops name}"),
            Err(TemplateError::Malformed(_))
        ));
        assert!(matches!(
            PromptTemplate::from_template("empty {}"),
            Err(TemplateError::Malformed(_))
        ));
    }

    #[test]
    fn raw_text_is_kept_verbatim() {
        let raw = "Line one {x}\r\n  {{braces}}\n";
        let t = PromptTemplate::from_template(raw).unwrap();
        assert_eq!(t.template(), raw);
    }
}
