// ABOUTME: Library module for the deck-slides program.
// ABOUTME: Contains core functionality for extracting slide content and writing PPTX decks.

// Reexport modules
pub mod config;
pub mod errors;
pub mod extract;
pub mod inline;
pub mod layout;
pub mod package;
pub mod pptx;
pub mod render;
pub mod resources;
pub mod shapes;
pub mod template;
pub mod utils;

// Reexport common types and functions
pub use config::DeckConfig;
pub use errors::{DeckError, Result};
pub use extract::{extract_slides, parse_markdown_file, Extractor, SlideRecord};
pub use layout::{LayoutRules, SlideLayout, SlideSelector};
pub use pptx::{generate_pptx, DeckReport, PptxConfig};
pub use render::{render_slides, RenderConfig, RenderedSlide};
pub use template::{DeckTemplate, TemplateSource};
