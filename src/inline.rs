// ABOUTME: Inline markdown handling for the deck-slides application
// ABOUTME: Turns bullet text with emphasis and code spans into styled text runs

use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};

/// A piece of text sharing one set of character styles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

#[derive(Clone, Copy, Default)]
struct Style {
    bold: bool,
    italic: bool,
    code: bool,
}

/// Split a line of inline markdown into styled runs. Markup characters are dropped.
pub fn inline_runs(text: &str) -> Vec<InlineRun> {
    let arena = Arena::new();
    let options = ComrakOptions::default();
    let root = parse_document(&arena, text, &options);

    let mut runs = Vec::new();
    collect_runs(root, Style::default(), &mut runs);

    if runs.is_empty() && !text.trim().is_empty() {
        runs.push(InlineRun {
            text: text.trim().to_string(),
            ..InlineRun::default()
        });
    }
    runs
}

/// Plain text of a line of inline markdown.
pub fn plain_text(text: &str) -> String {
    inline_runs(text).into_iter().map(|run| run.text).collect()
}

fn collect_runs<'a>(node: &'a AstNode<'a>, style: Style, runs: &mut Vec<InlineRun>) {
    let style = match &node.data.borrow().value {
        NodeValue::Text(text) => {
            push_run(runs, text, style);
            return;
        }
        NodeValue::Code(code) => {
            push_run(runs, &code.literal, Style { code: true, ..style });
            return;
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            push_run(runs, " ", style);
            return;
        }
        // Generic types like `List<T>` parse as raw HTML; keep them as text.
        NodeValue::HtmlInline(raw) => {
            push_run(runs, raw, style);
            return;
        }
        NodeValue::HtmlBlock(block) => {
            push_run(runs, block.literal.trim_end(), style);
            return;
        }
        NodeValue::Strong => Style { bold: true, ..style },
        NodeValue::Emph => Style {
            italic: true,
            ..style
        },
        _ => style,
    };

    for child in node.children() {
        collect_runs(child, style, runs);
    }
}

fn push_run(runs: &mut Vec<InlineRun>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = runs.last_mut() {
        if (last.bold, last.italic, last.code) == (style.bold, style.italic, style.code) {
            last.text.push_str(text);
            return;
        }
    }
    runs.push(InlineRun {
        text: text.to_string(),
        bold: style.bold,
        italic: style.italic,
        code: style.code,
    });
}
