// ABOUTME: Content extraction module for the deck-slides application
// ABOUTME: Scans slide-content markdown line by line and builds ordered slide records

use crate::errors::{DeckError, Result};
use crate::utils;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Labeled lists that feed a slide's bullets, in the order they are flattened.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Key Points",
    "Key Characteristics",
    "Benefits",
    "What We'll Do",
    "Features",
    "What's Missing",
    "Core Technologies",
    "Workflow",
    "Azure AI Foundry Benefits",
    "Best Practices",
];

/// One slide section extracted from the markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRecord {
    pub number: u32,
    /// Text following `Slide N:` in the section heading
    pub heading: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub definition: Option<String>,
    pub bullets: Vec<String>,
    pub code: Option<String>,
    pub code_language: Option<String>,
    pub notes: Option<String>,
}

impl SlideRecord {
    /// Create an empty record whose title falls back to `Slide N`.
    pub fn new(number: u32, heading: impl Into<String>) -> Self {
        Self {
            number,
            heading: heading.into(),
            title: format!("Slide {}", number),
            subtitle: None,
            definition: None,
            bullets: Vec::new(),
            code: None,
            code_language: None,
            notes: None,
        }
    }

    pub fn has_code(&self) -> bool {
        self.code.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Classified view of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    SlideHeading { number: u32, heading: &'a str },
    Terminal,
    Fence { info: &'a str },
    NotesHeading,
    Heading,
    Rule,
    Label { name: &'a str, value: &'a str },
    Item(&'a str),
    Quote(&'a str),
    Blank,
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(info) = trimmed.strip_prefix("```") {
        return Line::Fence { info: info.trim() };
    }
    if trimmed.starts_with('#') {
        return classify_heading(trimmed);
    }
    if trimmed.starts_with("---") {
        return Line::Rule;
    }
    if let Some(quoted) = trimmed.strip_prefix('>') {
        return Line::Quote(quoted.strip_prefix(' ').unwrap_or(quoted));
    }
    if let Some((name, value)) = parse_label(trimmed) {
        return Line::Label { name, value };
    }
    if let Some(item) = parse_list_item(trimmed) {
        return Line::Item(item);
    }
    Line::Text(trimmed)
}

fn classify_heading(trimmed: &str) -> Line<'_> {
    let text = trimmed.trim_start_matches('#');
    let level = trimmed.len() - text.len();
    let text = text.trim();

    if level == 2 {
        if let Some(rest) = text.strip_prefix("Slide ") {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if let (Ok(number), Some(heading)) = (
                rest[..digits_end].parse::<u32>(),
                rest[digits_end..].strip_prefix(':'),
            ) {
                return Line::SlideHeading {
                    number,
                    heading: heading.trim(),
                };
            }
        }
    }
    if (level >= 2 && text.starts_with("Appendix")) || text.starts_with("End of Document") {
        return Line::Terminal;
    }
    if level == 3 && text == "Speaker Notes" {
        return Line::NotesHeading;
    }
    Line::Heading
}

/// Parse `**Name**: value` or `**Name:** value`.
fn parse_label(trimmed: &str) -> Option<(&str, &str)> {
    let inner = trimmed.strip_prefix("**")?;
    let end = inner.find("**")?;
    let (name, after) = (&inner[..end], &inner[end + 2..]);

    let (name, value) = match name.strip_suffix(':') {
        Some(name) => (name, after),
        None => (name, after.strip_prefix(':')?),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Parse `- item`, `* item`, `+ item` or `1. item`, returning the item text.
fn parse_list_item(trimmed: &str) -> Option<&str> {
    let rest = if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
    {
        rest
    } else {
        let digits_end = trimmed.find(|c: char| !c.is_ascii_digit())?;
        if digits_end == 0 {
            return None;
        }
        let rest = trimmed[digits_end..].strip_prefix('.')?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest
    };
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Raw lines belonging to one `## Slide N:` section.
#[derive(Debug)]
struct Section<'a> {
    number: u32,
    heading: &'a str,
    lines: Vec<&'a str>,
}

/// Split the document into slide sections. Fenced code never opens or closes a section.
fn split_sections(markdown: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    let mut in_fence = false;

    for line in markdown.lines() {
        let kind = classify(line);
        if in_fence {
            if matches!(kind, Line::Fence { .. }) {
                in_fence = false;
            }
        } else {
            match kind {
                Line::SlideHeading { number, heading } => {
                    sections.extend(current.take());
                    current = Some(Section {
                        number,
                        heading,
                        lines: Vec::new(),
                    });
                    continue;
                }
                Line::Terminal => {
                    sections.extend(current.take());
                    continue;
                }
                Line::Fence { .. } => in_fence = true,
                _ => {}
            }
        }
        if let Some(section) = current.as_mut() {
            section.lines.push(line);
        }
    }

    sections.extend(current.take());
    sections
}

/// Forward-only cursor over the lines of one section.
struct Cursor<'s, 'a> {
    lines: &'s [&'a str],
    pos: usize,
}

impl<'s, 'a> Cursor<'s, 'a> {
    fn new(lines: &'s [&'a str]) -> Self {
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied().map(classify)
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    fn skip_blank(&mut self) {
        while let Some(Line::Blank) = self.peek() {
            self.pos += 1;
        }
    }

    /// Consume a fence body up to its closing fence. `None` when the fence never closes.
    fn take_fence_body(&mut self) -> Option<String> {
        let start = self.pos;
        let close = self.lines[start..]
            .iter()
            .position(|line| matches!(classify(line), Line::Fence { .. }));
        match close {
            Some(offset) => {
                self.pos = start + offset + 1;
                Some(self.lines[start..start + offset].join("\n"))
            }
            None => {
                self.pos = self.lines.len();
                None
            }
        }
    }

    /// Consume a run of list items after a label. Blank lines may precede the run.
    fn take_list(&mut self) -> Vec<String> {
        let start = self.pos;
        self.skip_blank();
        let mut items = Vec::new();
        while let Some(Line::Item(text)) = self.peek() {
            items.push(text.to_string());
            self.pos += 1;
        }
        if items.is_empty() {
            self.pos = start;
        }
        items
    }

    /// Value for a label written on its own line, taken from the next plain text line.
    fn take_continuation(&mut self) -> Option<&'a str> {
        let start = self.pos;
        self.skip_blank();
        if let Some(Line::Text(text)) = self.peek() {
            self.pos += 1;
            return Some(text);
        }
        self.pos = start;
        None
    }

    /// Consume a speaker-notes blockquote, ending at a rule, a `##` heading or section end.
    fn take_notes(&mut self) -> Option<String> {
        let start = self.pos;
        self.skip_blank();
        if !matches!(self.peek(), Some(Line::Quote(_))) {
            self.pos = start;
            return None;
        }

        let mut text = Vec::new();
        while let Some(raw) = self.lines.get(self.pos) {
            let trimmed = raw.trim_start();
            if trimmed.starts_with("##") || trimmed.starts_with("---") {
                break;
            }
            match classify(raw) {
                Line::Quote(quoted) => text.push(quoted.trim_end()),
                _ => text.push(raw.trim()),
            }
            self.pos += 1;
        }

        let joined = text.join("\n");
        let notes = joined.trim();
        (!notes.is_empty()).then(|| notes.to_string())
    }
}

/// Line-oriented slide extractor parameterized by its bullet categories.
#[derive(Debug, Clone)]
pub struct Extractor {
    categories: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_categories(DEFAULT_CATEGORIES.iter().copied())
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an extractor whose bullets flatten the given labels in order.
    pub fn with_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Extract every slide section in document order.
    pub fn extract(&self, markdown: &str) -> Vec<SlideRecord> {
        let records: Vec<SlideRecord> = split_sections(markdown)
            .iter()
            .map(|section| self.parse_section(section))
            .collect();
        debug!("Extracted {} slide records", records.len());
        records
    }

    fn parse_section(&self, section: &Section<'_>) -> SlideRecord {
        let mut record = SlideRecord::new(section.number, section.heading);
        let mut title = None;
        let mut lists: Vec<Vec<String>> = vec![Vec::new(); self.categories.len()];
        let mut cursor = Cursor::new(&section.lines);

        while let Some(line) = cursor.next_line() {
            match line {
                Line::Fence { info } => {
                    let Some(body) = cursor.take_fence_body() else {
                        continue;
                    };
                    let body = body.trim();
                    if record.code.is_none() && !body.is_empty() {
                        record.code = Some(body.to_string());
                        record.code_language = (!info.is_empty()).then(|| info.to_string());
                    }
                }
                Line::Label { name, value } => {
                    let slot = match name {
                        "Title" => Some(&mut title),
                        "Subtitle" => Some(&mut record.subtitle),
                        "Definition" => Some(&mut record.definition),
                        _ => None,
                    };
                    if let Some(slot) = slot {
                        let value = if value.is_empty() {
                            cursor.take_continuation()
                        } else {
                            Some(value)
                        };
                        if slot.is_none() {
                            *slot = value.map(str::to_string);
                        }
                    } else if value.is_empty() {
                        if let Some(idx) = self.categories.iter().position(|c| c == name) {
                            let items = cursor.take_list();
                            if lists[idx].is_empty() {
                                lists[idx] = items;
                            }
                        }
                    }
                }
                Line::NotesHeading => {
                    let notes = cursor.take_notes();
                    if record.notes.is_none() {
                        record.notes = notes;
                    }
                }
                _ => {}
            }
        }

        if let Some(title) = title {
            record.title = title;
        }
        record.bullets = lists.into_iter().flatten().collect();

        debug!(
            "Slide {}: {} bullets, code: {}, notes: {}",
            record.number,
            record.bullets.len(),
            record.has_code(),
            record.has_notes()
        );
        record
    }
}

/// Extract slide records from markdown text with the default categories.
pub fn extract_slides(markdown: &str) -> Vec<SlideRecord> {
    Extractor::default().extract(markdown)
}

/// Read a markdown file and extract its slide records.
pub fn parse_markdown_file(markdown_path: &Path) -> Result<Vec<SlideRecord>> {
    info!("Parsing slide content from: {:?}", markdown_path);
    utils::validate_file_exists(markdown_path)?;

    let content = fs::read_to_string(markdown_path).map_err(DeckError::FileReadError)?;
    Ok(extract_slides(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_slide_heading() {
        assert_eq!(
            classify("## Slide 12: Wrap Up"),
            Line::SlideHeading {
                number: 12,
                heading: "Wrap Up"
            }
        );
        assert_eq!(classify("### Slide 3: Nested"), Line::Heading);
        assert_eq!(classify("## Slide x: Bad"), Line::Heading);
        assert_eq!(classify("## Slide 4 Missing colon"), Line::Heading);
    }

    #[test]
    fn test_classify_terminal_headings() {
        assert_eq!(classify("## Appendix: Links"), Line::Terminal);
        assert_eq!(classify("# End of Document"), Line::Terminal);
        assert_eq!(classify("## End of Document"), Line::Terminal);
        assert_eq!(classify("# Appendix"), Line::Heading);
    }

    #[test]
    fn test_parse_label_forms() {
        assert_eq!(parse_label("**Title**: Welcome"), Some(("Title", "Welcome")));
        assert_eq!(parse_label("**Title:** Welcome"), Some(("Title", "Welcome")));
        assert_eq!(parse_label("**Key Points**:"), Some(("Key Points", "")));
        assert_eq!(parse_label("**Bold** text without colon"), None);
        assert_eq!(parse_label("****: empty"), None);
    }

    #[test]
    fn test_parse_list_items() {
        assert_eq!(parse_list_item("- First point"), Some("First point"));
        assert_eq!(parse_list_item("* Starred"), Some("Starred"));
        assert_eq!(parse_list_item("12. Twelfth"), Some("Twelfth"));
        assert_eq!(parse_list_item("1.NoSpace"), None);
        assert_eq!(parse_list_item("-"), None);
        assert_eq!(parse_list_item("**Bold**"), None);
    }

    #[test]
    fn test_fenced_slide_heading_does_not_split() {
        let markdown = "## Slide 1: A\n```\n## Slide 2: Not a slide\n```\n## Slide 3: B\n";
        let sections = split_sections(markdown);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].number, 1);
        assert_eq!(sections[1].number, 3);
    }

    #[test]
    fn test_unterminated_fence_yields_no_code() {
        let records = extract_slides("## Slide 2: Code\n```rust\nfn main() {}\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, None);
    }

    #[test]
    fn test_code_block_and_language() {
        let markdown = "## Slide 4: Demo\n```csharp\nvar x = 1;\n\nConsole.WriteLine(x);\n```\n```sh\nls\n```\n";
        let record = &extract_slides(markdown)[0];
        assert_eq!(
            record.code.as_deref(),
            Some("var x = 1;\n\nConsole.WriteLine(x);")
        );
        assert_eq!(record.code_language.as_deref(), Some("csharp"));
    }

    #[test]
    fn test_notes_end_at_rule() {
        let markdown = "## Slide 2: Notes\n### Speaker Notes\n\n> First line.\n>\n> Second line.\n\n---\n**Key Points**:\n- After rule\n";
        let record = &extract_slides(markdown)[0];
        assert_eq!(record.notes.as_deref(), Some("First line.\n\nSecond line."));
        assert_eq!(record.bullets, vec!["After rule"]);
    }

    #[test]
    fn test_notes_end_at_next_heading() {
        let markdown = "## Slide 2: Notes\n### Speaker Notes\n> Say hello.\n> Pause.\n### Summary\n**Key Points**:\n- After heading\n\n## Slide 3: Next\n### Speaker Notes\n> Only slide three.\n";
        let records = extract_slides(markdown);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].notes.as_deref(), Some("Say hello.\nPause."));
        assert_eq!(records[0].bullets, vec!["After heading"]);
        assert_eq!(records[1].notes.as_deref(), Some("Only slide three."));
    }

    #[test]
    fn test_slide_after_terminal_heading_opens_section() {
        let markdown = "## Slide 1: Start\n**Title**: Start\n\n## Appendix A\n**Key Points**:\n- Appendix only\n\n## Slide 2: Resumed\n**Title**: Resumed\n**Key Points**:\n- Kept\n\n# End of Document\n- Trailing text\n\n## Slide 3: Bonus\n**Title**: Bonus\n";
        let records = extract_slides(markdown);
        let numbers: Vec<u32> = records.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(records[0].bullets.is_empty());
        assert_eq!(records[1].title, "Resumed");
        assert_eq!(records[1].bullets, vec!["Kept"]);
        assert_eq!(records[2].title, "Bonus");
        assert!(records[2].bullets.is_empty());
    }

    #[test]
    fn test_first_field_occurrence_wins() {
        let markdown = "## Slide 2: Fields\n**Title**: First\n**Title**: Second\n**Definition:** Colon inside\n";
        let record = &extract_slides(markdown)[0];
        assert_eq!(record.title, "First");
        assert_eq!(record.heading, "Fields");
        assert_eq!(record.definition.as_deref(), Some("Colon inside"));
    }

    #[test]
    fn test_label_value_on_next_line() {
        let markdown = "## Slide 2: Wrapped\n**Subtitle**:\nOn its own line\n";
        let record = &extract_slides(markdown)[0];
        assert_eq!(record.subtitle.as_deref(), Some("On its own line"));
        assert_eq!(record.title, "Slide 2");
    }

    #[test]
    fn test_numbered_items_and_custom_categories() {
        let markdown = "## Slide 2: Steps\n**Steps**:\n1. Plan\n2. Build\n**Key Points**:\n- Default category\n";

        let default = &extract_slides(markdown)[0];
        assert_eq!(default.bullets, vec!["Default category"]);

        let extractor = Extractor::with_categories(["Steps"]);
        assert_eq!(extractor.categories(), ["Steps".to_string()]);
        let custom = &extractor.extract(markdown)[0];
        assert_eq!(custom.bullets, vec!["Plan", "Build"]);
    }
}
