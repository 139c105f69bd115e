// ABOUTME: PPTX generation module for the deck-slides application
// ABOUTME: Writes rendered slides and speaker notes into a presentation package on disk

use crate::errors::{DeckError, Result};
use crate::extract::SlideRecord;
use crate::layout::{slide_height, slide_width};
use crate::package::{next_relationship_id, relative_target, Package, Relationship};
use crate::render::{render_slides, RenderConfig, RenderedSlide};
use crate::resources::{content_types, rel_types};
use crate::template::{DeckTemplate, TemplateSource};
use crate::utils::{self, xml_text};
use log::{info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Extension list entry PowerPoint uses for slide sections, which refer to slide ids.
const SECTION_EXTENSION_URI: &str = "{521415D9-36F7-43E2-AB2F-B90AF26B5E84}";

/// First `p:sldId` value; PowerPoint requires ids of at least 256.
const FIRST_SLIDE_ID: u32 = 256;

/// Document properties written into the package
#[derive(Debug, Clone)]
pub struct PptxConfig {
    pub title: String,
    pub creator: String,
}

impl Default for PptxConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            creator: "deck-slides".to_string(),
        }
    }
}

/// Outcome of a successful deck generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckReport {
    pub slide_count: usize,
    pub notes_count: usize,
    pub template: TemplateSource,
    pub output: PathBuf,
}

/// Generate a PPTX presentation from slide records
pub fn generate_pptx(
    records: &[SlideRecord],
    template_path: Option<&Path>,
    output_file: &Path,
    render_config: &RenderConfig,
    pptx_config: &PptxConfig,
) -> Result<DeckReport> {
    info!("Generating PPTX with {} slides", records.len());

    let template = DeckTemplate::resolve(template_path)?;
    let slides = render_slides(records, render_config);
    let source = template.source.clone();

    let package = build_package(template, &slides, pptx_config)?;
    write_package(&package, output_file)?;

    info!("PPTX file created at {:?}", output_file);
    Ok(DeckReport {
        slide_count: slides.len(),
        notes_count: slides.iter().filter(|s| s.notes.is_some()).count(),
        template: source,
        output: output_file.to_path_buf(),
    })
}

/// Add the rendered slides to a template package.
pub fn build_package(
    template: DeckTemplate,
    slides: &[RenderedSlide],
    config: &PptxConfig,
) -> Result<Package> {
    let DeckTemplate {
        mut package,
        presentation_part,
        layout_part,
        notes_master_part,
        ..
    } = template;

    let mut presentation_rels = package.relationships(&presentation_part)?;
    let mut slide_rel_ids = Vec::with_capacity(slides.len());

    for slide in slides {
        let slide_part = package.free_part_name("ppt/slides/slide", "xml");
        info!("Creating slide XML: {}", slide_part);
        package.set_part(
            &slide_part,
            slide.slide_xml().into_bytes(),
            Some(content_types::SLIDE),
        );

        let mut slide_rels = vec![Relationship::new(
            "rId1",
            rel_types::SLIDE_LAYOUT,
            relative_target(&slide_part, &layout_part),
        )];

        if let Some(notes_xml) = slide.notes_xml() {
            let notes_part = package.free_part_name("ppt/notesSlides/notesSlide", "xml");
            info!("Creating notes XML: {}", notes_part);
            package.set_part(
                &notes_part,
                notes_xml.into_bytes(),
                Some(content_types::NOTES_SLIDE),
            );
            package.set_relationships(
                &notes_part,
                &[
                    Relationship::new(
                        "rId1",
                        rel_types::NOTES_MASTER,
                        relative_target(&notes_part, &notes_master_part),
                    ),
                    Relationship::new(
                        "rId2",
                        rel_types::SLIDE,
                        relative_target(&notes_part, &slide_part),
                    ),
                ],
            );
            slide_rels.push(Relationship::new(
                "rId2",
                rel_types::NOTES_SLIDE,
                relative_target(&slide_part, &notes_part),
            ));
        }
        package.set_relationships(&slide_part, &slide_rels);

        let rel_id = next_relationship_id(&presentation_rels);
        presentation_rels.push(Relationship::new(
            rel_id.clone(),
            rel_types::SLIDE,
            relative_target(&presentation_part, &slide_part),
        ));
        slide_rel_ids.push(rel_id);
    }
    package.set_relationships(&presentation_part, &presentation_rels);

    let notes_master_rel = presentation_rels
        .iter()
        .find(|rel| rel.rel_type == rel_types::NOTES_MASTER)
        .map(|rel| rel.id.clone());

    info!("Updating presentation part: {}", presentation_part);
    let presentation_xml = package.part_str(&presentation_part)?;
    let presentation_xml = rewrite_presentation(
        &presentation_xml,
        &slide_rel_ids,
        notes_master_rel.as_deref(),
        (slide_width(), slide_height()),
    )?;
    package.set_part(&presentation_part, presentation_xml.into_bytes(), None);

    write_document_properties(&mut package, slides, config)?;
    Ok(package)
}

/// Serialize a package to `output_file`, replacing any existing file.
pub fn write_package(package: &Package, output_file: &Path) -> Result<()> {
    utils::ensure_parent_directory_exists(output_file)?;

    let temp_path = utils::temporary_sibling(output_file);
    let result = write_and_rename(package, &temp_path, output_file);

    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!("Failed to clean up temporary file {:?}: {}", temp_path, e);
        }
    }
    result
}

fn write_and_rename(package: &Package, temp_path: &Path, output_file: &Path) -> Result<()> {
    let file = fs::File::create(temp_path)?;
    let writer = package.write_to(BufWriter::new(file))?;
    let file = writer
        .into_inner()
        .map_err(|e| DeckError::FileReadError(e.into_error()))?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, output_file)?;
    Ok(())
}

/// Rewrite the presentation part: replace the slide list, set the canvas size,
/// drop slide-dependent lists and point the notes master list at `notes_master_rel`.
fn rewrite_presentation(
    xml: &str,
    slide_rel_ids: &[String],
    notes_master_rel: Option<&str>,
    (cx, cy): (i64, i64),
) -> Result<String> {
    // Children of p:presentation that follow p:sldIdLst in schema order.
    const AFTER_SLIDE_LIST: &[&[u8]] = &[
        b"sldSz",
        b"notesSz",
        b"smartTags",
        b"embeddedFontLst",
        b"custShowLst",
        b"photoAlbum",
        b"custDataLst",
        b"kinsoku",
        b"defaultTextStyle",
        b"modifyVerifier",
        b"extLst",
    ];

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());

    let mut prefixes = Prefixes::default();
    let mut depth = 0usize;
    let mut skip_depth = 0usize;
    let mut wrote_slide_list = false;

    loop {
        let event = reader.read_event()?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_start = matches!(event, Event::Start(_));
                let local = e.local_name();
                let local = local.as_ref();

                if depth == 0 {
                    prefixes = Prefixes::from_root(e);
                }

                let dropped = local == b"sldIdLst"
                    || local == b"custShowLst"
                    || (local == b"notesMasterIdLst" && notes_master_rel.is_some())
                    || (local == b"ext"
                        && package_attribute(e, b"uri").as_deref() == Some(SECTION_EXTENSION_URI));
                if dropped {
                    if is_start {
                        skip_depth = 1;
                    }
                    continue;
                }

                if depth == 1 && !wrote_slide_list && AFTER_SLIDE_LIST.contains(&local) {
                    write_raw(&mut writer, &prefixes.slide_list(slide_rel_ids));
                    wrote_slide_list = true;
                    if local != b"sldSz" {
                        write_raw(&mut writer, &prefixes.slide_size(cx, cy));
                    }
                }

                if depth == 1 && local == b"sldSz" {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let mut size = BytesStart::new(name);
                    size.push_attribute(("cx", cx.to_string().as_str()));
                    size.push_attribute(("cy", cy.to_string().as_str()));
                    writer.write_event(Event::Empty(size))?;
                    if is_start {
                        skip_depth = 1;
                    }
                    continue;
                }

                writer.write_event(event.clone())?;
                if is_start {
                    depth += 1;
                } else if depth == 1 && local == b"sldMasterIdLst" {
                    write_notes_master_list(&mut writer, &prefixes, notes_master_rel);
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !wrote_slide_list {
                    write_raw(&mut writer, &prefixes.slide_list(slide_rel_ids));
                    write_raw(&mut writer, &prefixes.slide_size(cx, cy));
                    wrote_slide_list = true;
                }
                writer.write_event(Event::End(e.clone()))?;
                if depth == 1 && e.local_name().as_ref() == b"sldMasterIdLst" {
                    write_notes_master_list(&mut writer, &prefixes, notes_master_rel);
                }
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| DeckError::XmlError(format!("Presentation part is not UTF-8: {}", e)))
}

fn write_raw(writer: &mut Writer<Vec<u8>>, xml: &str) {
    writer.get_mut().extend_from_slice(xml.as_bytes());
}

fn write_notes_master_list(
    writer: &mut Writer<Vec<u8>>,
    prefixes: &Prefixes,
    notes_master_rel: Option<&str>,
) {
    if let Some(rel_id) = notes_master_rel {
        write_raw(writer, &prefixes.notes_master_list(rel_id));
    }
}

/// Unprefixed attribute value of an element.
fn package_attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Namespace prefixes declared on the presentation root.
#[derive(Debug, Clone)]
struct Prefixes {
    presentation: String,
    relationships: Option<String>,
}

impl Default for Prefixes {
    fn default() -> Self {
        Self {
            presentation: "p".to_string(),
            relationships: Some("r".to_string()),
        }
    }
}

impl Prefixes {
    fn from_root(root: &BytesStart<'_>) -> Self {
        let presentation = root
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned())
            .unwrap_or_default();
        let relationships = root.attributes().flatten().find_map(|attr| {
            let key = attr.key.as_ref();
            let prefix = key.strip_prefix(b"xmlns:")?;
            (&*attr.value == RELATIONSHIPS_NS.as_bytes())
                .then(|| String::from_utf8_lossy(prefix).into_owned())
        });
        Self {
            presentation,
            relationships,
        }
    }

    fn element(&self, local: &str) -> String {
        if self.presentation.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.presentation, local)
        }
    }

    /// `r:id` attribute, declaring the namespace locally when the root does not.
    fn rel_attribute(&self, rel_id: &str) -> String {
        match &self.relationships {
            Some(prefix) => format!(r#"{}:id="{}""#, prefix, xml_text(rel_id)),
            None => format!(
                r#"xmlns:rel="{}" rel:id="{}""#,
                RELATIONSHIPS_NS,
                xml_text(rel_id)
            ),
        }
    }

    fn slide_list(&self, slide_rel_ids: &[String]) -> String {
        if slide_rel_ids.is_empty() {
            return String::new();
        }
        let list = self.element("sldIdLst");
        let item = self.element("sldId");
        let mut xml = format!("<{}>", list);
        for (i, rel_id) in slide_rel_ids.iter().enumerate() {
            xml.push_str(&format!(
                r#"<{} id="{}" {}/>"#,
                item,
                FIRST_SLIDE_ID + i as u32,
                self.rel_attribute(rel_id)
            ));
        }
        xml.push_str(&format!("</{}>", list));
        xml
    }

    fn slide_size(&self, cx: i64, cy: i64) -> String {
        format!(r#"<{} cx="{}" cy="{}"/>"#, self.element("sldSz"), cx, cy)
    }

    fn notes_master_list(&self, rel_id: &str) -> String {
        let list = self.element("notesMasterIdLst");
        format!(
            r#"<{list}><{item} {rel}/></{list}>"#,
            list = list,
            item = self.element("notesMasterId"),
            rel = self.rel_attribute(rel_id)
        )
    }
}

/// Write `docProps/app.xml` and `docProps/core.xml`, reusing the template's locations.
fn write_document_properties(
    package: &mut Package,
    slides: &[RenderedSlide],
    config: &PptxConfig,
) -> Result<()> {
    let notes = slides.iter().filter(|s| s.notes.is_some()).count();
    let app_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>{}</Application><PresentationFormat>Widescreen</PresentationFormat><Slides>{}</Slides><Notes>{}</Notes></Properties>"#,
        xml_text(&config.creator),
        slides.len(),
        notes
    );

    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:creator>{creator}</dc:creator><cp:lastModifiedBy>{creator}</cp:lastModifiedBy><cp:revision>1</cp:revision><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#,
        title = xml_text(&config.title),
        creator = xml_text(&config.creator),
        now = now
    );

    let mut root_rels = package.relationships("")?;
    for (rel_type, default_part, content_type, xml) in [
        (
            rel_types::EXTENDED_PROPERTIES,
            "docProps/app.xml",
            content_types::EXTENDED_PROPERTIES,
            app_xml,
        ),
        (
            rel_types::CORE_PROPERTIES,
            "docProps/core.xml",
            content_types::CORE_PROPERTIES,
            core_xml,
        ),
    ] {
        let part = match package.related_parts("", rel_type)?.into_iter().next() {
            Some(part) => part,
            None => {
                root_rels.push(Relationship::new(
                    next_relationship_id(&root_rels),
                    rel_type,
                    default_part,
                ));
                default_part.to_string()
            }
        };
        info!("Creating PPTX structure: {}", part);
        package.set_part(&part, xml.into_bytes(), Some(content_type));
    }
    package.set_relationships("", &root_rels);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId7"/></p:sldIdLst><p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/><p:custShowLst><p:custShow name="Old" id="0"><p:sldLst><p:sld r:id="rId7"/></p:sldLst></p:custShow></p:custShowLst><p:extLst><p:ext uri="{521415D9-36F7-43E2-AB2F-B90AF26B5E84}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main"/></p:ext></p:extLst></p:presentation>"#;

    #[test]
    fn test_rewrite_replaces_slides_and_size() {
        let ids = vec!["rId8".to_string(), "rId9".to_string()];
        let xml = rewrite_presentation(PRESENTATION, &ids, Some("rId3"), (12_191_695, 6_858_000))
            .unwrap();

        assert!(xml.contains(
            r#"<p:sldIdLst><p:sldId id="256" r:id="rId8"/><p:sldId id="257" r:id="rId9"/></p:sldIdLst><p:sldSz cx="12191695" cy="6858000"/>"#
        ));
        assert!(!xml.contains("rId7"));
        assert!(!xml.contains("screen4x3"));
        assert!(!xml.contains("custShowLst"));
        assert!(!xml.contains("sectionLst"));
        assert!(xml.contains(
            r#"</p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId3"/></p:notesMasterIdLst>"#
        ));
        assert!(xml.contains("<p:extLst></p:extLst>"));
    }

    #[test]
    fn test_rewrite_without_slide_size_inserts_one() {
        let xml = r#"<p:presentation xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst/><p:notesSz cx="1" cy="2"/></p:presentation>"#;
        let out = rewrite_presentation(xml, &["rId2".to_string()], None, (10, 20)).unwrap();
        assert!(out.contains(
            r#"<p:sldMasterIdLst/><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="10" cy="20"/><p:notesSz"#
        ));
    }

    #[test]
    fn test_stale_notes_master_list_is_replaced() {
        let xml = r#"<p:presentation xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId99"/></p:notesMasterIdLst><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = rewrite_presentation(xml, &[], Some("rId5"), (10, 20)).unwrap();
        assert!(!out.contains("rId99"));
        assert_eq!(out.matches("<p:notesMasterIdLst>").count(), 1);
        assert!(out.contains(r#"<p:notesMasterId r:id="rId5"/>"#));
    }

    fn record(number: u32, notes: Option<&str>) -> SlideRecord {
        let mut record = SlideRecord::new(number, format!("Slide {}", number));
        record.title = format!("Topic {}", number);
        record.bullets = vec!["Point".to_string()];
        record.notes = notes.map(str::to_string);
        record
    }

    #[test]
    fn test_build_package_wires_slides_and_notes() {
        let records = vec![record(1, Some("Hello")), record(2, None)];
        let slides = render_slides(&records, &RenderConfig::default());
        let package =
            build_package(DeckTemplate::blank().unwrap(), &slides, &PptxConfig::default()).unwrap();

        assert_eq!(
            package.related_parts("ppt/presentation.xml", rel_types::SLIDE).unwrap(),
            vec!["ppt/slides/slide1.xml".to_string(), "ppt/slides/slide2.xml".to_string()]
        );
        assert_eq!(
            package.related_parts("ppt/slides/slide1.xml", rel_types::NOTES_SLIDE).unwrap(),
            vec!["ppt/notesSlides/notesSlide1.xml".to_string()]
        );
        assert!(package
            .related_parts("ppt/slides/slide2.xml", rel_types::NOTES_SLIDE)
            .unwrap()
            .is_empty());
        assert_eq!(
            package
                .related_parts("ppt/notesSlides/notesSlide1.xml", rel_types::SLIDE)
                .unwrap(),
            vec!["ppt/slides/slide1.xml".to_string()]
        );
        assert_eq!(
            package.content_type("ppt/notesSlides/notesSlide1.xml"),
            Some(content_types::NOTES_SLIDE)
        );

        let presentation = package.part_str("ppt/presentation.xml").unwrap();
        assert!(presentation.contains(r#"<p:sldId id="256""#));
        assert!(presentation.contains(r#"<p:sldId id="257""#));
        assert!(package.contains("docProps/core.xml"));
        assert!(package.contains("docProps/app.xml"));
        assert_eq!(
            package.main_part(rel_types::CORE_PROPERTIES).unwrap(),
            "docProps/core.xml"
        );
    }

    #[test]
    fn test_write_package_replaces_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("nested").join("deck.pptx");
        let package =
            build_package(DeckTemplate::blank().unwrap(), &[], &PptxConfig::default()).unwrap();

        write_package(&package, &output).unwrap();
        write_package(&package, &output).unwrap();

        assert!(output.is_file());
        let leftovers = fs::read_dir(output.parent().unwrap())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .map(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_undeclared_relationship_prefix_is_declared_locally() {
        let xml = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldSz cx="1" cy="1"/></p:presentation>"#;
        let out = rewrite_presentation(xml, &["rId4".to_string()], None, (10, 20)).unwrap();
        assert!(out.contains(r#"rel:id="rId4""#));
        assert!(out.contains("xmlns:rel="));
    }
}
