use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::ZipArchive;

const TWO_SLIDES: &str = "## Slide 1: Intro
**Title**: Welcome
**Subtitle**: A Demo

## Slide 2: Details
**Title**: Key Points
**Key Points**:
- First point
- Second point

### Speaker Notes
> Remember to smile.
";

fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_deck-slides"))
        .args(args)
        .env_remove("DECK_MARKDOWN_PATH")
        .env_remove("DECK_TEMPLATE_PATH")
        .env_remove("DECK_TITLE_SLIDE")
        .env_remove("DECK_CLOSING_SLIDE")
        .output()
        .expect("Failed to execute command")
}

fn read_entry(path: &Path, name: &str) -> String {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let mut archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    let mut entry = archive.by_name(name).expect("Missing entry in PPTX");
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .expect("Entry is not UTF-8");
    content
}

fn entry_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let mut archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .collect()
}

#[test]
fn test_generate_pptx_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let markdown_path = temp_dir.path().join("slides.md");
    fs::write(&markdown_path, TWO_SLIDES).expect("Failed to write markdown file");
    let output_path = temp_dir.path().join("output.pptx");

    let output = run_command(&[
        "--markdown",
        markdown_path.to_str().unwrap(),
        "--output",
        output_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 2 slides"));
    assert!(stdout.contains("  Slide 1: Welcome"));
    assert!(stdout.contains("  Slide 2: Key Points"));
    assert!(stdout.contains("Presentation saved to:"));

    let names = entry_names(&output_path);
    assert_eq!(names.first().map(String::as_str), Some("[Content_Types].xml"));

    let slide_files: Vec<&String> = names
        .iter()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .collect();
    assert_eq!(slide_files.len(), 2, "Expected exactly two slide XML files");

    let notes_files: Vec<&String> = names
        .iter()
        .filter(|name| name.starts_with("ppt/notesSlides/notesSlide") && name.ends_with(".xml"))
        .collect();
    assert_eq!(notes_files.len(), 1, "Expected one notes slide");
    assert!(read_entry(&output_path, notes_files[0]).contains("Remember to smile."));

    let title_slide = read_entry(&output_path, "ppt/slides/slide1.xml");
    assert!(title_slide.contains("Welcome"));
    assert!(title_slide.contains("A Demo"));

    let content_slide = read_entry(&output_path, "ppt/slides/slide2.xml");
    assert_eq!(content_slide.matches("First point").count(), 1);
    assert_eq!(content_slide.matches("Second point").count(), 1);

    let presentation = read_entry(&output_path, "ppt/presentation.xml");
    assert!(presentation.contains(r#"<p:sldSz cx="12191695" cy="6858000"/>"#));

    let content_types = read_entry(&output_path, "[Content_Types].xml");
    assert!(content_types.contains(r#"PartName="/ppt/slides/slide2.xml""#));
    assert!(content_types.contains(r#"PartName="/ppt/notesSlides/notesSlide1.xml""#));
}

#[test]
fn test_output_directories_are_created() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let markdown_path = temp_dir.path().join("slides.md");
    fs::write(&markdown_path, TWO_SLIDES).expect("Failed to write markdown file");
    let output_path = temp_dir.path().join("out").join("decks").join("talk.pptx");

    let output = run_command(&[
        "-m",
        markdown_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_path.is_file(), "PPTX file was not created");
}
