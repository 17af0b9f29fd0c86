// SPDX-License-Identifier: GPL-3.0-only

//! Prompt template sent alongside the image

use crate::config::Config;
use crate::constants::prompt;

/// Selected program ("track") of the graduate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
}

/// Who the photo is for; passed explicitly into every generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    pub display_name: String,
    pub track: Option<Track>,
}

impl GenerationContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            display_name: config.display_name_or_default().to_string(),
            track: config
                .track
                .as_ref()
                .filter(|t| !t.trim().is_empty())
                .map(|name| Track { name: name.clone() }),
        }
    }
}

/// Template with `{track}` and `{name}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    default_track_phrase: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(prompt::DEFAULT_TEMPLATE, prompt::DEFAULT_TRACK_PHRASE)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, default_track_phrase: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            default_track_phrase: default_track_phrase.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.prompt_template, &config.default_track_phrase)
    }

    pub fn render(&self, context: &GenerationContext) -> String {
        let track = context
            .track
            .as_ref()
            .map_or(self.default_track_phrase.as_str(), |t| t.name.as_str());
        let name = if context.display_name.trim().is_empty() {
            prompt::DEFAULT_DISPLAY_NAME
        } else {
            context.display_name.as_str()
        };

        // Single pass so substituted values are never expanded again
        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{track}") {
                rendered.push_str(track);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{name}") {
                rendered.push_str(name);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_name_is_embedded() {
        let template = PromptTemplate::new("Portrait of {name}, {track} graduate", "a");
        let context = GenerationContext {
            display_name: "Ana".into(),
            track: Some(Track {
                name: "Gastronomy".into(),
            }),
        };
        assert_eq!(template.render(&context), "Portrait of Ana, Gastronomy graduate");
    }

    #[test]
    fn missing_track_uses_default_phrase() {
        let context = GenerationContext {
            display_name: String::new(),
            track: None,
        };
        let rendered = PromptTemplate::default().render(&context);
        assert!(rendered.contains(prompt::DEFAULT_TRACK_PHRASE));
        assert!(!rendered.contains("{track}"));
    }

    #[test]
    fn context_from_config_ignores_blank_track() {
        let config = Config {
            track: Some("  ".into()),
            ..Config::default()
        };
        let context = GenerationContext::from_config(&config);
        assert_eq!(context.track, None);
        assert_eq!(context.display_name, prompt::DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn substituted_values_are_not_expanded() {
        let template = PromptTemplate::new("{name} studied {track} {other}", "a");
        let context = GenerationContext {
            display_name: "{track}".into(),
            track: Some(Track {
                name: "Chef {name}".into(),
            }),
        };
        assert_eq!(template.render(&context), "{track} studied Chef {name} {other}");
    }
}
