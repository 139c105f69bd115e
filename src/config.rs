// ABOUTME: Configuration module for the deck-slides application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::layout::{LayoutRules, SlideSelector};
use crate::pptx::PptxConfig;
use crate::render::RenderConfig;
use log::warn;
use std::env;
use std::path::PathBuf;

/// Markdown file read when neither the CLI nor the environment names one
pub const DEFAULT_MARKDOWN_PATH: &str = "docs/05_slide-content-and-speaker-notes.md";

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub markdown_path: PathBuf,
    pub template_path: Option<PathBuf>,
    pub title_slide: SlideSelector,
    pub closing_slide: SlideSelector,
    pub code_font: String,
    pub closing_caption: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        let rules = LayoutRules::default();
        let render = RenderConfig::default();
        Self {
            markdown_path: PathBuf::from(DEFAULT_MARKDOWN_PATH),
            template_path: None,
            title_slide: rules.title_slide,
            closing_slide: rules.closing_slide,
            code_font: render.code_font,
            closing_caption: render.closing_caption,
        }
    }
}

impl DeckConfig {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, falling back to defaults for
    /// unset or invalid values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let selector = |key: &str, fallback: SlideSelector| match non_empty(key) {
            Some(value) => value.parse::<SlideSelector>().unwrap_or_else(|e| {
                warn!("Ignoring {}: {}", key, e);
                fallback
            }),
            None => fallback,
        };

        Self {
            markdown_path: non_empty("DECK_MARKDOWN_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.markdown_path),
            template_path: non_empty("DECK_TEMPLATE_PATH").map(PathBuf::from),
            title_slide: selector("DECK_TITLE_SLIDE", defaults.title_slide),
            closing_slide: selector("DECK_CLOSING_SLIDE", defaults.closing_slide),
            code_font: non_empty("DECK_CODE_FONT").unwrap_or(defaults.code_font),
            closing_caption: non_empty("DECK_CLOSING_CAPTION").unwrap_or(defaults.closing_caption),
        }
    }

    /// Get a render configuration with defaults from this config
    pub fn get_render_config(
        &self,
        title_slide: Option<SlideSelector>,
        closing_slide: Option<SlideSelector>,
    ) -> RenderConfig {
        RenderConfig {
            rules: LayoutRules {
                title_slide: title_slide.unwrap_or(self.title_slide),
                closing_slide: closing_slide.unwrap_or(self.closing_slide),
            },
            closing_caption: self.closing_caption.clone(),
            code_font: self.code_font.clone(),
            ..RenderConfig::default()
        }
    }

    /// Get a PPTX configuration with defaults
    pub fn get_pptx_config(&self, title: Option<String>) -> PptxConfig {
        let defaults = PptxConfig::default();
        PptxConfig {
            title: title.unwrap_or(defaults.title),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeckConfig::new();
        assert_eq!(config.markdown_path, PathBuf::from(DEFAULT_MARKDOWN_PATH));
        assert_eq!(config.template_path, None);
        assert_eq!(config.title_slide, SlideSelector::Number(1));
        assert_eq!(config.closing_slide, SlideSelector::Number(14));
        assert_eq!(config.code_font, "Consolas");
    }

    #[test]
    fn test_lookup_overrides() {
        let config = DeckConfig::from_lookup(lookup(&[
            ("DECK_MARKDOWN_PATH", "talk.md"),
            ("DECK_TEMPLATE_PATH", "brand.pptx"),
            ("DECK_CLOSING_SLIDE", "last"),
            ("DECK_CODE_FONT", "Fira Code"),
        ]));
        assert_eq!(config.markdown_path, PathBuf::from("talk.md"));
        assert_eq!(config.template_path, Some(PathBuf::from("brand.pptx")));
        assert_eq!(config.closing_slide, SlideSelector::Last);
        assert_eq!(config.code_font, "Fira Code");
    }

    #[test]
    fn test_invalid_selector_falls_back() {
        let config = DeckConfig::from_lookup(lookup(&[("DECK_TITLE_SLIDE", "second")]));
        assert_eq!(config.title_slide, SlideSelector::Number(1));
    }

    #[test]
    fn test_render_config_prefers_explicit_selectors() {
        let config = DeckConfig::from_lookup(lookup(&[("DECK_CLOSING_CAPTION", "Questions?")]));
        let render = config.get_render_config(Some(SlideSelector::First), None);
        assert_eq!(render.rules.title_slide, SlideSelector::First);
        assert_eq!(render.rules.closing_slide, SlideSelector::Number(14));
        assert_eq!(render.closing_caption, "Questions?");
        assert_eq!(render.bullet_glyph, "\u{2022}");
    }
}
