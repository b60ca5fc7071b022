//! Prompt templates with named placeholders checked at construction
//!
//! Placeholders are written `{name}`; `{{` and `}}` produce literal braces.
//! A template declares its placeholder names up front and construction fails
//! unless the text uses exactly that set. Rendering fails on a missing or
//! unexpected value instead of leaving a hole in the prompt.

use ahash::AHashSet;
use thiserror::Error;

/// Grounded answer prompt; `{context}` is the retrieved chunks joined by separators
pub const GROUNDING_PROMPT: &str = "Answer the question based only on the following context:

{context}

---

Answer the question based on the above context: {question}";

/// Global/local scope classifier prompt
pub const CLASSIFIER_PROMPT: &str = "You're a smart assistant. Classify the following question.

Does it require reading the **entire document** (\"global\") or just **a few relevant parts** (\"local\")?

Note: If the question asks for all names, all titles, or a comprehensive list of things mentioned anywhere in the document, classify it as \"global\".

Question:
\"{query}\"

Respond with just one word: \"global\" or \"local\".";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed placeholder starting at byte {0}")]
    Unclosed(usize),

    #[error("Unmatched '}}' at byte {0}")]
    UnmatchedBrace(usize),

    #[error("Invalid placeholder name: {{{0}}}")]
    InvalidPlaceholder(String),

    #[error("Template uses undeclared placeholder: {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("Declared placeholder never used: {{{0}}}")]
    UnusedPlaceholder(String),

    #[error("No value supplied for placeholder: {{{0}}}")]
    MissingValue(String),

    #[error("Value supplied for unknown placeholder: {0}")]
    UnexpectedValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    names: Vec<String>,
}

impl PromptTemplate {
    /// Parse `text` and check it uses exactly the placeholders in `names`
    pub fn new(text: &str, names: &[&str]) -> Result<Self, TemplateError> {
        let segments = parse(text)?;

        let used: AHashSet<&str> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();
        let declared: AHashSet<&str> = names.iter().copied().collect();

        if let Some(name) = segments.iter().find_map(|segment| match segment {
            Segment::Slot(name) if !declared.contains(name.as_str()) => Some(name),
            _ => None,
        }) {
            return Err(TemplateError::UnknownPlaceholder(name.clone()));
        }
        if let Some(name) = names.iter().find(|name| !used.contains(**name)) {
            return Err(TemplateError::UnusedPlaceholder(name.to_string()));
        }

        Ok(Self {
            segments,
            names: names.iter().map(|name| name.to_string()).collect(),
        })
    }

    /// The grounded answer prompt over `context` and `question`
    pub fn grounding() -> Result<Self, TemplateError> {
        Self::new(GROUNDING_PROMPT, &["context", "question"])
    }

    /// The scope classifier prompt over `query`
    pub fn classifier() -> Result<Self, TemplateError> {
        Self::new(CLASSIFIER_PROMPT, &["query"])
    }

    pub fn placeholders(&self) -> &[String] {
        &self.names
    }

    /// Substitute every placeholder
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        if let Some((name, _)) = values
            .iter()
            .find(|(name, _)| !self.names.iter().any(|declared| declared.as_str() == *name))
        {
            return Err(TemplateError::UnexpectedValue(name.to_string()));
        }

        let lookup = |name: &str| {
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| TemplateError::MissingValue(name.to_string()))
        };

        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Slot(name) => rendered.push_str(lookup(name.as_str())?),
            }
        }
        Ok(rendered)
    }
}

fn parse(text: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(TemplateError::UnmatchedBrace(position)),
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(TemplateError::Unclosed(position));
                }
                if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                    return Err(TemplateError::InvalidPlaceholder(name));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(name));
            }
            _ => literal.push(c),
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
    fn test_builtin_templates_parse() {
        let grounding = PromptTemplate::grounding().unwrap();
        assert_eq!(grounding.placeholders(), ["context", "question"]);
        assert!(PromptTemplate::classifier().is_ok());
    }

    #[test]
    fn test_render_grounding() {
        let template = PromptTemplate::grounding().unwrap();
        let prompt = template
            .render(&[("context", "chunk one"), ("question", "Who is Arjuna?")])
            .unwrap();

        assert!(prompt.starts_with("Answer the question based only on the following context:\n\nchunk one\n\n---\n\n"));
        assert!(prompt.ends_with("based on the above context: Who is Arjuna?"));
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let template = PromptTemplate::classifier().unwrap();
        let prompt = template.render(&[("query", "what is {context}?")]).unwrap();
        assert!(prompt.contains("\"what is {context}?\""));
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::new("{{literal}} {name}", &["name"]).unwrap();
        assert_eq!(template.render(&[("name", "x")]).unwrap(), "{literal} x");
    }

    #[test]
    fn test_declared_set_must_match() {
        assert_eq!(
            PromptTemplate::new("{a} {b}", &["a"]).unwrap_err(),
            TemplateError::UnknownPlaceholder("b".to_string())
        );
        assert_eq!(
            PromptTemplate::new("{a}", &["a", "b"]).unwrap_err(),
            TemplateError::UnusedPlaceholder("b".to_string())
        );
    }

    #[test]
    fn test_malformed_templates() {
        assert_eq!(
            PromptTemplate::new("hello {name", &["name"]).unwrap_err(),
            TemplateError::Unclosed(6)
        );
        assert_eq!(
            PromptTemplate::new("oops }", &[]).unwrap_err(),
            TemplateError::UnmatchedBrace(5)
        );
        assert!(matches!(
            PromptTemplate::new("{two words}", &["two words"]),
            Err(TemplateError::InvalidPlaceholder(_))
        ));
    }

    #[test]
    fn test_render_checks_values() {
        let template = PromptTemplate::grounding().unwrap();
        assert_eq!(
            template.render(&[("context", "c")]).unwrap_err(),
            TemplateError::MissingValue("question".to_string())
        );
        assert_eq!(
            template
                .render(&[("context", "c"), ("question", "q"), ("extra", "e")])
                .unwrap_err(),
            TemplateError::UnexpectedValue("extra".to_string())
        );
    }
}
