// ABOUTME: Shape model for the deck-slides application
// ABOUTME: Text boxes, rectangles, paragraphs and runs with their DrawingML serialization

use crate::layout::{centipoints, Rect};
use crate::utils::xml_text;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A run of text with uniform character formatting. Newlines become line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub font: Option<String>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, size: u32) -> Self {
        Self {
            text: text.into(),
            size,
            bold: false,
            italic: false,
            font: None,
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    fn properties_xml(&self, tag: &str) -> String {
        let mut xml = format!(r#"<a:{} lang="en-US" sz="{}""#, tag, centipoints(self.size));
        if self.bold {
            xml.push_str(r#" b="1""#);
        }
        if self.italic {
            xml.push_str(r#" i="1""#);
        }
        xml.push_str(r#" dirty="0""#);
        match &self.font {
            Some(font) => {
                let face = xml_text(font);
                xml.push_str(&format!(
                    r#"><a:latin typeface="{face}"/><a:cs typeface="{face}"/></a:{tag}>"#,
                    face = face,
                    tag = tag
                ));
            }
            None => xml.push_str("/>"),
        }
        xml
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();
        for (i, line) in self.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<a:br>");
                xml.push_str(&self.properties_xml("rPr"));
                xml.push_str("</a:br>");
            }
            if line.is_empty() {
                continue;
            }
            xml.push_str("<a:r>");
            xml.push_str(&self.properties_xml("rPr"));
            xml.push_str(&format!("<a:t>{}</a:t></a:r>", xml_text(line)));
        }
        xml
    }
}

/// A paragraph of runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub align: Option<Align>,
    /// Space after the paragraph, in points
    pub space_after: Option<u32>,
}

impl Paragraph {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn single(run: TextRun) -> Self {
        Self::new(vec![run])
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn space_after(mut self, points: u32) -> Self {
        self.space_after = Some(points);
        self
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from("<a:p>");

        let algn = match self.align {
            Some(Align::Center) => Some("ctr"),
            Some(Align::Left) => Some("l"),
            None => None,
        };
        if algn.is_some() || self.space_after.is_some() {
            xml.push_str("<a:pPr");
            if let Some(algn) = algn {
                xml.push_str(&format!(r#" algn="{}""#, algn));
            }
            match self.space_after {
                Some(points) => xml.push_str(&format!(
                    r#"><a:spcAft><a:spcPts val="{}"/></a:spcAft></a:pPr>"#,
                    centipoints(points)
                )),
                None => xml.push_str("/>"),
            }
        }

        for run in &self.runs {
            xml.push_str(&run.to_xml());
        }
        if let Some(last) = self.runs.last() {
            xml.push_str(&last.properties_xml("endParaRPr"));
        }
        xml.push_str("</a:p>");
        xml
    }
}

/// A text box shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub name: String,
    pub rect: Rect,
    pub paragraphs: Vec<Paragraph>,
    pub word_wrap: bool,
}

impl TextBox {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            paragraphs: Vec::new(),
            word_wrap: false,
        }
    }

    pub fn word_wrap(mut self, wrap: bool) -> Self {
        self.word_wrap = wrap;
        self
    }

    pub fn paragraph(mut self, paragraph: Paragraph) -> Self {
        self.paragraphs.push(paragraph);
        self
    }

    pub fn paragraphs(mut self, paragraphs: impl IntoIterator<Item = Paragraph>) -> Self {
        self.paragraphs.extend(paragraphs);
        self
    }

    /// Text of the box, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A filled rectangle with an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rectangle {
    pub name: String,
    pub rect: Rect,
    pub fill: Rgb,
    pub line: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    TextBox(TextBox),
    Rectangle(Rectangle),
}

impl Shape {
    pub fn name(&self) -> &str {
        match self {
            Shape::TextBox(text_box) => &text_box.name,
            Shape::Rectangle(rectangle) => &rectangle.name,
        }
    }

    pub fn as_text_box(&self) -> Option<&TextBox> {
        match self {
            Shape::TextBox(text_box) => Some(text_box),
            Shape::Rectangle(_) => None,
        }
    }

    /// Serialize as a `p:sp` element with the given shape id.
    pub fn to_xml(&self, id: u32) -> String {
        match self {
            Shape::TextBox(text_box) => {
                let wrap = if text_box.word_wrap { "square" } else { "none" };
                let paragraphs: String = if text_box.paragraphs.is_empty() {
                    r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#.to_string()
                } else {
                    text_box.paragraphs.iter().map(Paragraph::to_xml).collect()
                };
                format!(
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name} {index}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="{wrap}" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
                    id = id,
                    name = xml_text(&text_box.name),
                    index = id - 1,
                    xfrm = xfrm_xml(&text_box.rect),
                    wrap = wrap,
                    paragraphs = paragraphs
                )
            }
            Shape::Rectangle(rectangle) => format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name} {index}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{fill}"/></a:solidFill><a:ln><a:solidFill><a:srgbClr val="{line}"/></a:solidFill></a:ln></p:spPr><p:txBody><a:bodyPr rtlCol="0" anchor="ctr"/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:endParaRPr lang="en-US" dirty="0"/></a:p></p:txBody></p:sp>"#,
                id = id,
                name = xml_text(&rectangle.name),
                index = id - 1,
                xfrm = xfrm_xml(&rectangle.rect),
                fill = rectangle.fill.hex(),
                line = rectangle.line.hex()
            ),
        }
    }
}

fn xfrm_xml(rect: &Rect) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        rect.x, rect.y, rect.cx, rect.cy
    )
}
