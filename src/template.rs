// ABOUTME: Style template handling for the deck-slides application
// ABOUTME: Opens a template deck, strips its slides and keeps masters, layouts and theme

use crate::errors::{DeckError, Result};
use crate::package::{
    attribute_map, next_relationship_id, relative_target, resolve_target, Package, Relationship,
};
use crate::resources::{rel_types, BLANK_DECK, NOTES_MASTER_PARTS};
use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where the styling of a generated deck came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Built-in blank deck, no template requested
    Blank,
    /// The given template file
    Template(PathBuf),
    /// A template was requested but does not exist; the blank deck was used
    Missing(PathBuf),
}

impl TemplateSource {
    pub fn is_missing(&self) -> bool {
        matches!(self, TemplateSource::Missing(_))
    }
}

/// A slide-free package ready to receive generated slides.
#[derive(Debug, Clone)]
pub struct DeckTemplate {
    pub package: Package,
    pub source: TemplateSource,
    /// The `ppt/presentation.xml`-like main part
    pub presentation_part: String,
    /// Layout every generated slide is based on
    pub layout_part: String,
    pub notes_master_part: String,
}

impl DeckTemplate {
    /// Pick the template for a run. A missing path falls back to the blank deck.
    pub fn resolve(template_path: Option<&Path>) -> Result<Self> {
        match template_path {
            Some(path) if path.exists() => Self::open(path),
            Some(path) => {
                info!("Template {:?} not found, falling back to the blank deck", path);
                Self::prepare(
                    Package::from_resources(BLANK_DECK),
                    TemplateSource::Missing(path.to_path_buf()),
                )
            }
            None => Self::blank(),
        }
    }

    /// The built-in blank deck.
    pub fn blank() -> Result<Self> {
        Self::prepare(Package::from_resources(BLANK_DECK), TemplateSource::Blank)
    }

    /// Open an existing presentation as a style template.
    pub fn open(path: &Path) -> Result<Self> {
        info!("Using template: {:?}", path);
        let file = File::open(path).map_err(DeckError::FileReadError)?;
        let package = Package::from_reader(BufReader::new(file)).map_err(|e| {
            DeckError::TemplateError {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        Self::prepare(package, TemplateSource::Template(path.to_path_buf()))
    }

    fn prepare(mut package: Package, source: TemplateSource) -> Result<Self> {
        let presentation_part = package.main_part(rel_types::OFFICE_DOCUMENT)?;
        let removed = strip_slides(&mut package, &presentation_part)?;
        if removed > 0 {
            info!("Removed {} parts carried by the template's slides", removed);
        }

        let notes_master_part = ensure_notes_master(&mut package, &presentation_part)?;
        let layout_part = select_layout(&package, &presentation_part)?;
        debug!(
            "Template ready: layout {}, notes master {}",
            layout_part, notes_master_part
        );

        Ok(Self {
            package,
            source,
            presentation_part,
            layout_part,
            notes_master_part,
        })
    }
}

/// Drop the slide relationships of the presentation and everything only they reached.
fn strip_slides(package: &mut Package, presentation_part: &str) -> Result<usize> {
    let rels = package.relationships(presentation_part)?;
    let kept: Vec<Relationship> = rels
        .iter()
        .filter(|rel| rel.rel_type != rel_types::SLIDE)
        .cloned()
        .collect();
    if kept.len() != rels.len() {
        debug!("Dropping {} slide relationships", rels.len() - kept.len());
        package.set_relationships(presentation_part, &kept);
    }
    package.collect_garbage()
}

/// The presentation's notes master, adding the built-in one when the template has none.
fn ensure_notes_master(package: &mut Package, presentation_part: &str) -> Result<String> {
    if let Some(existing) = package
        .related_parts(presentation_part, rel_types::NOTES_MASTER)?
        .into_iter()
        .next()
    {
        return Ok(existing);
    }

    let [master, theme] = NOTES_MASTER_PARTS else {
        return Err(DeckError::MissingPart("built-in notes master".to_string()));
    };
    let master_name = package.free_part_name("ppt/notesMasters/notesMaster", "xml");
    let theme_name = package.free_part_name("ppt/theme/theme", "xml");
    debug!("Adding notes master {} with theme {}", master_name, theme_name);

    package.set_part(&theme_name, theme.data.as_bytes().to_vec(), theme.content_type);
    package.set_part(&master_name, master.data.as_bytes().to_vec(), master.content_type);
    package.set_relationships(
        &master_name,
        &[Relationship::new(
            "rId1",
            rel_types::THEME,
            relative_target(&master_name, &theme_name),
        )],
    );

    let mut rels = package.relationships(presentation_part)?;
    rels.push(Relationship::new(
        next_relationship_id(&rels),
        rel_types::NOTES_MASTER,
        relative_target(presentation_part, &master_name),
    ));
    package.set_relationships(presentation_part, &rels);
    Ok(master_name)
}

/// Layout for generated slides: the first master's blank layout, else its seventh, else its first.
fn select_layout(package: &Package, presentation_part: &str) -> Result<String> {
    let master = package
        .related_parts(presentation_part, rel_types::SLIDE_MASTER)?
        .into_iter()
        .next()
        .ok_or_else(|| DeckError::MissingPart("slide master".to_string()))?;

    let layouts = ordered_layouts(package, &master)?;
    if layouts.is_empty() {
        return Err(DeckError::MissingPart(format!("slide layout in {}", master)));
    }

    for layout in &layouts {
        if root_attribute(package, layout, "type")?.as_deref() == Some("blank") {
            return Ok(layout.clone());
        }
    }
    Ok(layouts.get(6).unwrap_or(&layouts[0]).clone())
}

/// Layouts of a master in `p:sldLayoutIdLst` order.
fn ordered_layouts(package: &Package, master: &str) -> Result<Vec<String>> {
    let rels = package.relationships(master)?;
    let xml = package.part_str(master)?;
    let mut reader = Reader::from_str(&xml);
    reader.trim_text(true);

    let mut layouts = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e)
                if e.local_name().as_ref() == b"sldLayoutId" =>
            {
                let Some(rid) = relationship_attribute(e) else {
                    continue;
                };
                if let Some(rel) = rels.iter().find(|rel| rel.id == rid) {
                    let target = resolve_target(master, &rel.target);
                    if package.contains(&target) {
                        layouts.push(target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(layouts)
}

/// The prefixed `r:id` attribute of an element, as opposed to its plain `id`.
fn relationship_attribute(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// An attribute of a part's root element.
fn root_attribute(package: &Package, part: &str, name: &str) -> Result<Option<String>> {
    let xml = package.part_str(part)?;
    let mut reader = Reader::from_str(&xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                return Ok(attribute_map(e).remove(name));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
