// ABOUTME: Built-in resources for the deck-slides application
// ABOUTME: Package parts of the default blank deck used when no style template is given

/// Content types of the parts this crate writes or ships.
pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Relationship types used when wiring parts together.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
}

/// A part of the default blank deck.
#[derive(Debug, Clone, Copy)]
pub struct ResourcePart {
    pub name: &'static str,
    /// Override content type; `None` for parts covered by an extension default
    pub content_type: Option<&'static str>,
    pub data: &'static str,
}

macro_rules! blank_part {
    ($name:literal, $content_type:expr) => {
        ResourcePart {
            name: $name,
            content_type: $content_type,
            data: include_str!(concat!("../assets/blank/", $name)),
        }
    };
}

/// Every part of the blank deck: one slide master with a single blank layout,
/// a notes master, their themes and the presentation-level property parts.
pub const BLANK_DECK: &[ResourcePart] = &[
    blank_part!("_rels/.rels", None),
    blank_part!("ppt/presentation.xml", Some(content_types::PRESENTATION)),
    blank_part!("ppt/_rels/presentation.xml.rels", None),
    blank_part!("ppt/presProps.xml", Some(content_types::PRES_PROPS)),
    blank_part!("ppt/viewProps.xml", Some(content_types::VIEW_PROPS)),
    blank_part!("ppt/tableStyles.xml", Some(content_types::TABLE_STYLES)),
    blank_part!("ppt/slideMasters/slideMaster1.xml", Some(content_types::SLIDE_MASTER)),
    blank_part!("ppt/slideMasters/_rels/slideMaster1.xml.rels", None),
    blank_part!("ppt/slideLayouts/slideLayout1.xml", Some(content_types::SLIDE_LAYOUT)),
    blank_part!("ppt/slideLayouts/_rels/slideLayout1.xml.rels", None),
    blank_part!("ppt/notesMasters/notesMaster1.xml", Some(content_types::NOTES_MASTER)),
    blank_part!("ppt/notesMasters/_rels/notesMaster1.xml.rels", None),
    blank_part!("ppt/theme/theme1.xml", Some(content_types::THEME)),
    blank_part!("ppt/theme/theme2.xml", Some(content_types::THEME)),
];

/// Notes master and its theme, added to templates that have no notes master of their own.
pub const NOTES_MASTER_PARTS: &[ResourcePart] = &[
    blank_part!("ppt/notesMasters/notesMaster1.xml", Some(content_types::NOTES_MASTER)),
    blank_part!("ppt/theme/theme2.xml", Some(content_types::THEME)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_deck_parts_are_xml() {
        for part in BLANK_DECK {
            assert!(
                part.data.starts_with("<?xml"),
                "{} is not an XML document",
                part.name
            );
        }
    }

    #[test]
    fn test_blank_deck_has_blank_layout() {
        let layout = BLANK_DECK
            .iter()
            .find(|p| p.name == "ppt/slideLayouts/slideLayout1.xml")
            .unwrap();
        assert!(layout.data.contains(r#"type="blank""#));
    }
}
