//! Description template for destination repositories.
//!
//! Placeholders are `{description}`, `{url}`, `{website}`, `{full_name}` and
//! `{clone_url}`; `{{` and `}}` produce literal braces.

use thiserror::Error;

use crate::sync::SourceRepository;

/// Default description of a destination repository.
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "{description} (Mirror of {url})";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder {{{name}}} in description template")]
    UnknownPlaceholder { name: String },

    #[error("Unclosed `{{` at byte {position} in description template")]
    Unclosed { position: usize },

    #[error("Unmatched `}}` at byte {position} in description template")]
    Unmatched { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Description,
    Url,
    Website,
    FullName,
    CloneUrl,
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "description" => Some(Self::Description),
            "url" => Some(Self::Url),
            "website" => Some(Self::Website),
            "full_name" => Some(Self::FullName),
            "clone_url" => Some(Self::CloneUrl),
            _ => None,
        }
    }

    fn value(self, repo: &SourceRepository) -> &str {
        let value = match self {
            Self::Description => Some(repo.description.as_str()),
            Self::Url => repo.html_url.as_deref(),
            Self::Website => repo.website.as_deref(),
            Self::FullName => Some(repo.full_name.as_str()),
            Self::CloneUrl => repo.clone_url.as_deref(),
        };
        value.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// A parsed description template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionTemplate {
    segments: Vec<Segment>,
}

impl DescriptionTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if chars.next_if(|&(_, c)| c == '{').is_some() => literal.push('{'),
                '}' if chars.next_if(|&(_, c)| c == '}').is_some() => literal.push('}'),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) => name.push(c),
                            None => return Err(TemplateError::Unclosed { position }),
                        }
                    }
                    let field = Placeholder::parse(&name)
                        .ok_or(TemplateError::UnknownPlaceholder { name })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(TemplateError::Unmatched { position }),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Render the template for `repo`; missing values render as empty strings.
    pub fn render(&self, repo: &SourceRepository) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Field(field) => field.value(repo),
            })
            .collect()
    }
}

impl Default for DescriptionTemplate {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Field(Placeholder::Description),
                Segment::Literal(" (Mirror of ".to_string()),
                Segment::Field(Placeholder::Url),
                Segment::Literal(")".to_string()),
            ],
        }
    }
}

impl std::str::FromStr for DescriptionTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> SourceRepository {
        SourceRepository {
            owner: "alice".to_string(),
            name: "tool".to_string(),
            full_name: "alice/tool".to_string(),
            description: "A tool".to_string(),
            html_url: Some("https://forge.example/alice/tool".to_string()),
            clone_url: Some("https://forge.example/alice/tool.git".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_template() {
        let template = DescriptionTemplate::default();
        assert_eq!(
            template,
            DescriptionTemplate::parse(DEFAULT_DESCRIPTION_TEMPLATE).unwrap()
        );
        assert_eq!(
            template.render(&repo()),
            "A tool (Mirror of https://forge.example/alice/tool)"
        );
    }

    #[test]
    fn test_all_placeholders() {
        let mut repo = repo();
        repo.website = Some("https://tool.example".to_string());
        let template =
            DescriptionTemplate::parse("{full_name}|{website}|{clone_url}|{description}").unwrap();
        assert_eq!(
            template.render(&repo),
            "alice/tool|https://tool.example|https://forge.example/alice/tool.git|A tool"
        );
    }

    #[test]
    fn test_missing_values_render_empty() {
        let template = DescriptionTemplate::parse("[{website}]").unwrap();
        assert_eq!(template.render(&repo()), "[]");
    }

    #[test]
    fn test_escaped_braces() {
        let template = DescriptionTemplate::parse("{{{full_name}}} {{x}}").unwrap();
        assert_eq!(template.render(&repo()), "{alice/tool} {x}");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            DescriptionTemplate::parse("{owner}").unwrap_err(),
            TemplateError::UnknownPlaceholder {
                name: "owner".to_string()
            }
        );
        assert_eq!(
            DescriptionTemplate::parse("ab{url").unwrap_err(),
            TemplateError::Unclosed { position: 2 }
        );
        assert_eq!(
            DescriptionTemplate::parse("a}b").unwrap_err(),
            TemplateError::Unmatched { position: 1 }
        );
        assert!(
            DescriptionTemplate::parse("{}")
                .unwrap_err()
                .to_string()
                .contains("{}")
        );
    }
}
