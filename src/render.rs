// ABOUTME: Slide rendering module for the deck-slides application
// ABOUTME: Maps each slide record onto the title, closing, code or content layout

use crate::extract::SlideRecord;
use crate::inline::inline_runs;
use crate::layout::{LayoutRules, Rect, SlideLayout};
use crate::shapes::{Align, Paragraph, Rectangle, Rgb, Shape, TextBox, TextRun};
use crate::utils::xml_text;
use log::{debug, info};

const SLIDE_NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const GROUP_PROPERTIES: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

/// Configuration for slide rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub rules: LayoutRules,
    pub closing_caption: String,
    pub code_font: String,
    pub bullet_glyph: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rules: LayoutRules::default(),
            closing_caption: "Thank You!".to_string(),
            code_font: "Consolas".to_string(),
            bullet_glyph: "\u{2022}".to_string(),
        }
    }
}

/// A slide ready to be written: its shapes in z-order plus optional notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSlide {
    pub number: u32,
    pub title: String,
    pub layout: SlideLayout,
    pub shapes: Vec<Shape>,
    pub notes: Option<String>,
}

impl RenderedSlide {
    /// Text boxes of the slide, back to front.
    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBox> {
        self.shapes.iter().filter_map(Shape::as_text_box)
    }

    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.name() == name)
    }

    /// The `p:sld` part for this slide.
    pub fn slide_xml(&self) -> String {
        let shapes: String = self
            .shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| shape.to_xml(i as u32 + 2))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {namespaces}><p:cSld><p:spTree>{group}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            namespaces = SLIDE_NAMESPACES,
            group = GROUP_PROPERTIES,
            shapes = shapes
        )
    }

    /// The `p:notes` part for this slide, when it has notes.
    pub fn notes_xml(&self) -> Option<String> {
        let notes = self.notes.as_deref().filter(|n| !n.is_empty())?;
        let paragraphs: String = notes
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#.to_string()
                } else {
                    format!(
                        r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                        xml_text(line)
                    )
                }
            })
            .collect();
        Some(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {namespaces}><p:cSld><p:spTree>{group}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#,
            namespaces = SLIDE_NAMESPACES,
            group = GROUP_PROPERTIES,
            paragraphs = paragraphs
        ))
    }
}

/// Render every record in document order
pub fn render_slides(records: &[SlideRecord], config: &RenderConfig) -> Vec<RenderedSlide> {
    info!("Rendering {} slides", records.len());
    let total = records.len();
    records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let layout = config.rules.select(record, position, total);
            debug!("Slide {} uses the {} layout", record.number, layout);
            render_slide(record, layout, config)
        })
        .collect()
}

/// Render one record with an already selected layout
pub fn render_slide(record: &SlideRecord, layout: SlideLayout, config: &RenderConfig) -> RenderedSlide {
    let shapes = match layout {
        SlideLayout::Title => title_shapes(record),
        SlideLayout::Closing => closing_shapes(record, config),
        SlideLayout::Code => code_shapes(record, config),
        SlideLayout::Content => content_shapes(record, config),
    };

    RenderedSlide {
        number: record.number,
        title: record.title.clone(),
        layout,
        shapes,
        notes: record.notes.clone().filter(|n| !n.is_empty()),
    }
}

fn centered_box(name: &str, rect: Rect, run: TextRun) -> Shape {
    Shape::TextBox(TextBox::new(name, rect).paragraph(Paragraph::single(run).align(Align::Center)))
}

fn heading_box(record: &SlideRecord) -> Shape {
    Shape::TextBox(
        TextBox::new("Title", Rect::from_inches(0.5, 0.3, 12.333, 0.8))
            .paragraph(Paragraph::single(TextRun::new(&record.title, 32).bold(true))),
    )
}

fn title_shapes(record: &SlideRecord) -> Vec<Shape> {
    let mut shapes = vec![centered_box(
        "Title",
        Rect::from_inches(0.5, 2.0, 12.333, 1.5),
        TextRun::new(&record.title, 44).bold(true),
    )];
    if let Some(subtitle) = record.subtitle.as_deref().filter(|s| !s.is_empty()) {
        shapes.push(centered_box(
            "Subtitle",
            Rect::from_inches(0.5, 3.5, 12.333, 1.0),
            TextRun::new(subtitle, 24),
        ));
    }
    shapes
}

fn closing_shapes(record: &SlideRecord, config: &RenderConfig) -> Vec<Shape> {
    vec![
        centered_box(
            "Title",
            Rect::from_inches(0.5, 2.5, 12.333, 1.5),
            TextRun::new(&record.title, 48).bold(true),
        ),
        centered_box(
            "Caption",
            Rect::from_inches(0.5, 4.0, 12.333, 1.0),
            TextRun::new(&config.closing_caption, 32),
        ),
    ]
}

/// Title, shaded background, then the code box in front of it.
fn code_shapes(record: &SlideRecord, config: &RenderConfig) -> Vec<Shape> {
    let code = record.code.as_deref().unwrap_or_default();
    debug!(
        "Slide {} code block: {} lines, language {}",
        record.number,
        code.lines().count(),
        record.code_language.as_deref().unwrap_or("unspecified")
    );
    vec![
        heading_box(record),
        Shape::Rectangle(Rectangle {
            name: "Code Background".to_string(),
            rect: Rect::from_inches(0.4, 1.2, 12.5, 5.2),
            fill: Rgb(240, 240, 240),
            line: Rgb(200, 200, 200),
        }),
        Shape::TextBox(
            TextBox::new("Code", Rect::from_inches(0.5, 1.3, 12.333, 5.0))
                .word_wrap(true)
                .paragraphs(code.lines().map(|line| {
                    Paragraph::single(TextRun::new(line, 12).font(&config.code_font))
                })),
        ),
    ]
}

fn content_shapes(record: &SlideRecord, config: &RenderConfig) -> Vec<Shape> {
    let mut shapes = vec![heading_box(record)];

    let mut top = 1.2;
    if let Some(definition) = record.definition.as_deref().filter(|d| !d.is_empty()) {
        shapes.push(Shape::TextBox(
            TextBox::new("Definition", Rect::from_inches(0.5, top, 12.333, 0.6))
                .paragraph(Paragraph::single(TextRun::new(definition, 18).italic(true))),
        ));
        top += 0.8;
    }

    if !record.bullets.is_empty() {
        let paragraphs = record
            .bullets
            .iter()
            .map(|bullet| bullet_paragraph(bullet, config));
        shapes.push(Shape::TextBox(
            TextBox::new("Bullets", Rect::from_inches(0.5, top, 12.333, 5.5))
                .word_wrap(true)
                .paragraphs(paragraphs),
        ));
    }
    shapes
}

fn bullet_paragraph(bullet: &str, config: &RenderConfig) -> Paragraph {
    let mut runs = vec![TextRun::new(format!("{} ", config.bullet_glyph), 18)];
    runs.extend(inline_runs(bullet).into_iter().map(|run| {
        let text_run = TextRun::new(run.text, 18).bold(run.bold).italic(run.italic);
        if run.code {
            text_run.font(&config.code_font)
        } else {
            text_run
        }
    }));
    Paragraph::new(runs).space_after(12)
}
