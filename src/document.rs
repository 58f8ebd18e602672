//! Integration flow documents built from "Step N: Title" replies.
//!
//! A reply like
//!
//! ```text
//! Step 1: Validate
//! Trigger: HTTP
//! Step 2: Transform
//! Logic: Map fields
//! ```
//!
//! becomes a `.docx` with a title, a "Flow Breakdown" heading, one heading per
//! step and one paragraph per body line, `key:` in bold when the line has one.
//!
//! Segmentation is a plain split on the literal `"Step "`, so that text inside
//! a value line (`Note: see Step 4`) also starts a new step.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use docx_rs::{Docx, Paragraph, Run, Style, StyleType};
use tracing::info;

use crate::error::{FerryError, Result};

pub const DEFAULT_TITLE: &str = "Integration Flow";
pub const BREAKDOWN_HEADING: &str = "Flow Breakdown";
pub const STEP_DELIMITER: &str = "Step ";

/// One body line of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `key: value`, rendered with the key in bold.
    Field { key: String, value: String },
    Text(String),
}

/// A "Step N: Title" section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSection {
    pub number: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl StepSection {
    pub fn heading(&self) -> String {
        format!("Step {}: {}", self.number, self.title)
            .trim_end()
            .to_string()
    }
}

/// Structured form of a flow reply, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDocument {
    pub title: String,
    /// Lines before the first step marker.
    pub preamble: Vec<Block>,
    pub steps: Vec<StepSection>,
}

/// Parse `content` into a flow document titled `title` (blank -> [`DEFAULT_TITLE`]).
pub fn format_flow(title: &str, content: &str) -> FlowDocument {
    let title = match title.trim() {
        "" => DEFAULT_TITLE.to_string(),
        t => t.to_string(),
    };

    let mut segments = content.split(STEP_DELIMITER);
    let preamble = segments
        .next()
        .map(|lead| parse_blocks(lead.lines()))
        .unwrap_or_default();

    let steps = segments
        .filter(|segment| !segment.trim().is_empty())
        .map(parse_step)
        .collect();

    FlowDocument {
        title,
        preamble,
        steps,
    }
}

fn parse_step(segment: &str) -> StepSection {
    let mut lines = segment.lines();
    let header = lines.next().unwrap_or_default();
    let (number, title) = match header.split_once(':') {
        Some((number, title)) => (number.trim(), title.trim()),
        None => (header.trim(), ""),
    };
    StepSection {
        number: number.to_string(),
        title: title.to_string(),
        blocks: parse_blocks(lines),
    }
}

fn parse_blocks<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<Block> {
    lines.filter_map(parse_line).collect()
}

/// Lines starting with `<` are never split, so tag-like content stays whole.
fn parse_line(line: &str) -> Option<Block> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('<') {
        if let Some((key, value)) = line.split_once(':') {
            return Some(Block::Field {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            });
        }
    }
    Some(Block::Text(line.to_string()))
}

impl FlowDocument {
    /// Build the Word document.
    pub fn to_docx(&self) -> Docx {
        let mut docx = Docx::new()
            .add_style(
                Style::new("Heading1", StyleType::Paragraph)
                    .name("Heading 1")
                    .size(32)
                    .bold(),
            )
            .add_style(
                Style::new("Heading2", StyleType::Paragraph)
                    .name("Heading 2")
                    .size(28)
                    .bold(),
            )
            .add_paragraph(heading(&self.title, 1))
            .add_paragraph(heading(BREAKDOWN_HEADING, 2));

        for block in &self.preamble {
            docx = docx.add_paragraph(block_paragraph(block));
        }
        for step in &self.steps {
            docx = docx.add_paragraph(heading(&step.heading(), 2));
            for block in &step.blocks {
                docx = docx.add_paragraph(block_paragraph(block));
            }
        }
        docx
    }

    /// Write the `.docx` to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.to_docx()
            .build()
            .pack(file)
            .map_err(|e| FerryError::Document(format!("Failed to generate DOCX: {e}")))
    }
}

fn heading(text: &str, level: u8) -> Paragraph {
    let size = if level == 1 { 32 } else { 28 };
    Paragraph::new()
        .style(&format!("Heading{level}"))
        .add_run(Run::new().add_text(text).size(size).bold())
}

fn block_paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Field { key, value } => Paragraph::new()
            .add_run(Run::new().add_text(format!("{key}:")).bold())
            .add_run(Run::new().add_text(format!(" {value}"))),
        Block::Text(text) => Paragraph::new().add_run(Run::new().add_text(text)),
    }
}

/// Saves flow documents under one directory with timestamped names.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    output_dir: PathBuf,
}

impl DocumentWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `integration_flow_<YYYYMMDD-HHMMSS>.docx`
    pub fn file_name(at: DateTime<Local>) -> String {
        format!("integration_flow_{}.docx", at.format("%Y%m%d-%H%M%S"))
    }

    pub fn save(&self, document: &FlowDocument) -> Result<PathBuf> {
        self.save_at(document, Local::now())
    }

    pub fn save_at(&self, document: &FlowDocument, at: DateTime<Local>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(Self::file_name(at));
        document.write_to(&path)?;
        info!(path = %path.display(), steps = document.steps.len(), "saved flow document");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn field(key: &str, value: &str) -> Block {
        Block::Field {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn two_steps_with_one_field_each() {
        let doc = format_flow(
            DEFAULT_TITLE,
            "Step 1: Validate\nTrigger: HTTP\nStep 2: Transform\nLogic: Map fields",
        );

        assert_eq!(doc.title, "Integration Flow");
        assert!(doc.preamble.is_empty());
        assert_eq!(doc.steps.len(), 2);
        assert_eq!(doc.steps[0].heading(), "Step 1: Validate");
        assert_eq!(doc.steps[0].blocks, vec![field("Trigger", "HTTP")]);
        assert_eq!(doc.steps[1].heading(), "Step 2: Transform");
        assert_eq!(doc.steps[1].blocks, vec![field("Logic", "Map fields")]);
    }

    #[test]
    fn content_without_delimiter_has_no_steps() {
        let doc = format_flow("", "Just a summary\nwith two lines");
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert!(doc.steps.is_empty());
        assert_eq!(
            doc.preamble,
            vec![
                Block::Text("Just a summary".into()),
                Block::Text("with two lines".into())
            ]
        );
    }

    #[test]
    fn header_without_colon_is_all_number() {
        let doc = format_flow("Flow", "Step 3\nplain line\n\n   \n");
        assert_eq!(doc.steps[0].number, "3");
        assert_eq!(doc.steps[0].title, "");
        assert_eq!(doc.steps[0].heading(), "Step 3:");
        assert_eq!(doc.steps[0].blocks, vec![Block::Text("plain line".into())]);
    }

    #[test]
    fn tag_lines_are_not_split() {
        let doc = format_flow("Flow", "Step 1: Map\n<set-payload value=\"a:b\"/>\nTarget: Salesforce");
        assert_eq!(
            doc.steps[0].blocks,
            vec![
                Block::Text("<set-payload value=\"a:b\"/>".into()),
                field("Target", "Salesforce"),
            ]
        );
    }

    #[test]
    fn step_inside_a_value_starts_a_new_section() {
        let doc = format_flow("Flow", "Step 1: Call\nNote: retry as in Step 4: Retry\n");
        assert_eq!(doc.steps.len(), 2);
        assert_eq!(doc.steps[0].blocks, vec![field("Note", "retry as in")]);
        assert_eq!(doc.steps[1].heading(), "Step 4: Retry");
    }

    #[test]
    fn file_name_uses_second_resolution_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            DocumentWriter::file_name(at),
            "integration_flow_20240309-070501.docx"
        );
    }

    #[test]
    fn save_writes_a_zip_container() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path().join("generated_docs"));
        let doc = format_flow(DEFAULT_TITLE, "Step 1: Validate\nTrigger: HTTP");

        let path = writer.save(&doc).unwrap();

        assert!(path.starts_with(dir.path().join("generated_docs")));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
