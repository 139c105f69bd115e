// ABOUTME: Package module for the deck-slides application
// ABOUTME: In-memory Open Packaging Conventions container backing a PPTX file

use crate::errors::{DeckError, Result};
use crate::resources::{content_types, ResourcePart};
use crate::utils::xml_text;
use log::{debug, info};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Seek, Write};
use zip::{write::FileOptions, ZipArchive, ZipWriter};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub fn new(id: impl Into<String>, rel_type: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        }
    }
}

/// Parts of a presentation package, keyed by part name without the leading slash.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl Package {
    /// An empty package with the extension defaults every package needs.
    pub fn new() -> Self {
        let mut package = Self::default();
        package
            .defaults
            .insert("rels".to_string(), content_types::RELATIONSHIPS.to_string());
        package
            .defaults
            .insert("xml".to_string(), content_types::XML.to_string());
        package
    }

    /// Build a package from built-in resource parts.
    pub fn from_resources(resources: &[ResourcePart]) -> Self {
        let mut package = Self::new();
        for resource in resources {
            package.set_part(resource.name, resource.data.as_bytes().to_vec(), resource.content_type);
        }
        package
    }

    /// Read every part of a ZIP container.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut package = Self::default();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(DeckError::FileReadError)?;
            package.parts.insert(name, data);
        }

        let content_types = package
            .parts
            .remove(CONTENT_TYPES_PART)
            .ok_or_else(|| DeckError::MissingPart(CONTENT_TYPES_PART.to_string()))?;
        package.parse_content_types(&String::from_utf8_lossy(&content_types))?;

        debug!("Read package with {} parts", package.parts.len());
        Ok(package)
    }

    fn parse_content_types(&mut self, xml: &str) -> Result<()> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Empty(ref e) | Event::Start(ref e) => {
                    let attrs = attribute_map(e);
                    let content_type = attrs.get("ContentType").cloned().unwrap_or_default();
                    match e.local_name().as_ref() {
                        b"Default" => {
                            if let Some(ext) = attrs.get("Extension") {
                                self.defaults.insert(ext.to_lowercase(), content_type);
                            }
                        }
                        b"Override" => {
                            if let Some(part) = attrs.get("PartName") {
                                self.overrides
                                    .insert(part.trim_start_matches('/').to_string(), content_type);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| DeckError::MissingPart(name.to_string()))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| DeckError::XmlError(format!("{} is not valid UTF-8: {}", name, e)))
    }

    /// Insert or replace a part. A content type registers an override for it.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>, content_type: Option<&str>) {
        if let Some(content_type) = content_type {
            self.overrides.insert(name.to_string(), content_type.to_string());
        }
        self.parts.insert(name.to_string(), data);
    }

    pub fn remove_part(&mut self, name: &str) {
        self.parts.remove(name);
        self.overrides.remove(name);
    }

    /// Content type of a part from its override or its extension default.
    pub fn content_type(&self, name: &str) -> Option<&str> {
        if let Some(content_type) = self.overrides.get(name) {
            return Some(content_type);
        }
        let ext = name.rsplit_once('.')?.1.to_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }

    /// Relationships whose source is `source` (`""` for the package root).
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>> {
        match self.part(&rels_path(source)) {
            Some(data) => parse_relationships(&String::from_utf8_lossy(data)),
            None => Ok(Vec::new()),
        }
    }

    pub fn set_relationships(&mut self, source: &str, relationships: &[Relationship]) {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in relationships {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                xml_text(&rel.id),
                xml_text(&rel.rel_type),
                xml_text(&rel.target),
                if rel.external { r#" TargetMode="External""# } else { "" }
            ));
        }
        xml.push_str("</Relationships>");
        self.parts.insert(rels_path(source), xml.into_bytes());
    }

    /// Parts `source` points at with the given relationship type, in document order.
    pub fn related_parts(&self, source: &str, rel_type: &str) -> Result<Vec<String>> {
        Ok(self
            .relationships(source)?
            .into_iter()
            .filter(|rel| !rel.external && rel.rel_type == rel_type)
            .map(|rel| resolve_target(source, &rel.target))
            .collect())
    }

    /// The main part the package root points at with `rel_type`.
    pub fn main_part(&self, rel_type: &str) -> Result<String> {
        self.related_parts("", rel_type)?
            .into_iter()
            .next()
            .ok_or_else(|| DeckError::MissingPart(format!("package relationship {}", rel_type)))
    }

    /// First unused part name of the form `{prefix}{n}.{ext}`.
    pub fn free_part_name(&self, prefix: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{}{}.{}", prefix, n, ext))
            .find(|name| !self.parts.contains_key(name))
            .unwrap_or_else(|| format!("{}.{}", prefix, ext))
    }

    /// Drop every part that cannot be reached from the package root relationships.
    pub fn collect_garbage(&mut self) -> Result<usize> {
        let mut reachable = BTreeSet::new();
        reachable.insert(ROOT_RELS_PART.to_string());
        let mut queue = vec![String::new()];

        while let Some(source) = queue.pop() {
            let rels = rels_path(&source);
            if self.parts.contains_key(&rels) {
                reachable.insert(rels);
            }
            for rel in self.relationships(&source)? {
                if rel.external {
                    continue;
                }
                let target = resolve_target(&source, &rel.target);
                if self.parts.contains_key(&target) && reachable.insert(target.clone()) {
                    queue.push(target);
                }
            }
        }

        let unreachable: Vec<String> = self
            .parts
            .keys()
            .filter(|name| !reachable.contains(*name))
            .cloned()
            .collect();
        for name in &unreachable {
            debug!("Dropping unreachable part {}", name);
            self.remove_part(name);
        }
        self.overrides.retain(|name, _| self.parts.contains_key(name));
        Ok(unreachable.len())
    }

    /// The `[Content_Types].xml` document for the current parts.
    pub fn content_types_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                xml_text(ext),
                xml_text(content_type)
            ));
        }
        for (name, content_type) in &self.overrides {
            if self.parts.contains_key(name) {
                xml.push_str(&format!(
                    r#"<Override PartName="/{}" ContentType="{}"/>"#,
                    xml_text(name),
                    xml_text(content_type)
                ));
            }
        }
        xml.push_str("</Types>");
        xml
    }

    /// Serialize the package as a ZIP container.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default();

        zip.start_file(CONTENT_TYPES_PART, options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        info!("Finalizing package with {} parts", self.parts.len() + 1);
        Ok(zip.finish()?)
    }
}

/// Name of the `.rels` part holding relationships of `source`.
pub fn rels_path(source: &str) -> String {
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if source.is_empty() => ROOT_RELS_PART.to_string(),
        None => format!("_rels/{}.rels", source),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relative reference from `source` to the part `target`.
pub fn relative_target(source: &str, target: &str) -> String {
    let source_dirs: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target_segments: Vec<&str> = target.split('/').collect();
    let (target_dirs, file) = target_segments.split_at(target_segments.len() - 1);

    let common = source_dirs
        .iter()
        .zip(target_dirs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; source_dirs.len() - common];
    parts.extend_from_slice(&target_dirs[common..]);
    parts.extend_from_slice(file);
    parts.join("/")
}

/// Next `rIdN` not used by any of the relationships.
pub fn next_relationship_id(relationships: &[Relationship]) -> String {
    let max = relationships
        .iter()
        .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut attrs = attribute_map(e);
                relationships.push(Relationship {
                    id: attrs.remove("Id").unwrap_or_default(),
                    rel_type: attrs.remove("Type").unwrap_or_default(),
                    target: attrs.remove("Target").unwrap_or_default(),
                    external: attrs
                        .get("TargetMode")
                        .is_some_and(|mode| mode == "External"),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(relationships)
}

/// Unescaped attributes of an element keyed by local name.
pub fn attribute_map(element: &quick_xml::events::BytesStart<'_>) -> BTreeMap<String, String> {
    element
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{rel_types, BLANK_DECK};
    use std::io::Cursor;

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path(""), "_rels/.rels");
        assert_eq!(rels_path("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
        assert_eq!(
            rels_path("ppt/slides/slide3.xml"),
            "ppt/slides/_rels/slide3.xml.rels"
        );
    }

    #[test]
    fn test_resolve_and_relativize_targets() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout7.xml"),
            "ppt/slideLayouts/slideLayout7.xml"
        );
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(resolve_target("ppt/presentation.xml", "/ppt/x.xml"), "ppt/x.xml");
        assert_eq!(
            relative_target("ppt/slides/slide1.xml", "ppt/slideLayouts/slideLayout7.xml"),
            "../slideLayouts/slideLayout7.xml"
        );
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/slides/slide2.xml"),
            "slides/slide2.xml"
        );
        assert_eq!(relative_target("", "docProps/app.xml"), "docProps/app.xml");
    }

    #[test]
    fn test_next_relationship_id() {
        let rels = vec![
            Relationship::new("rId3", rel_types::THEME, "theme/theme1.xml"),
            Relationship::new("rId10", rel_types::SLIDE, "slides/slide1.xml"),
            Relationship::new("custom", rel_types::SLIDE, "slides/slide2.xml"),
        ];
        assert_eq!(next_relationship_id(&rels), "rId11");
        assert_eq!(next_relationship_id(&[]), "rId1");
    }

    #[test]
    fn test_garbage_collection_keeps_reachable_parts() {
        let mut package = Package::from_resources(BLANK_DECK);
        package.set_part("ppt/media/orphan.png", vec![1, 2, 3], None);
        let dropped = package.collect_garbage().unwrap();
        assert_eq!(dropped, 1);
        assert!(!package.contains("ppt/media/orphan.png"));
        assert!(package.contains("ppt/slideLayouts/slideLayout1.xml"));
        assert!(package.contains("ppt/theme/theme2.xml"));
    }

    #[test]
    fn test_zip_round_trip_preserves_content_types() {
        let package = Package::from_resources(BLANK_DECK);
        let buffer = package.write_to(Cursor::new(Vec::new())).unwrap();
        let reread = Package::from_reader(Cursor::new(buffer.into_inner())).unwrap();
        assert_eq!(
            reread.content_type("ppt/presentation.xml"),
            Some(content_types::PRESENTATION)
        );
        assert_eq!(
            reread.content_type("ppt/_rels/presentation.xml.rels"),
            Some(content_types::RELATIONSHIPS)
        );
        assert_eq!(
            reread.main_part(rel_types::OFFICE_DOCUMENT).unwrap(),
            "ppt/presentation.xml"
        );
    }
}
