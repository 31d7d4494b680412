use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::{distributions::Alphanumeric, Rng};
use vitae::error::ResumeError;
use vitae::layout::{Block, ControlKind, SectionKind};
use vitae::raster::BlockPainter;
use vitae::resume::{ExperienceItem, Resume};
use vitae::snapshot::{ExportOutcome, MemoryDownloads};
use vitae::text_export::{MemoryClipboard, COPY_ACKNOWLEDGMENT_MESSAGE};
use vitae::view::{ResultPage, ResultView, LOAD_FAILED_MESSAGE, NO_RESUME_MESSAGE};

struct RandomResumeConfiguration {
    resumes_to_generate: u32,
    maximum_number_of_elements: usize,
    string_length_range: Range<usize>,
}

const CONFIGURATION: RandomResumeConfiguration = RandomResumeConfiguration {
    resumes_to_generate: 40,
    maximum_number_of_elements: 6,
    string_length_range: 1..40,
};

fn random_string(rng: &mut impl Rng) -> String {
    let length = rng.gen_range(CONFIGURATION.string_length_range.clone());
    let word = std::iter::repeat_with(|| char::from(rng.sample(Alphanumeric)))
        .take(length)
        .collect::<String>();

    // Some values carry spaces and line breaks, as generated text does.
    match rng.gen_range(0..4) {
        0 => format!("{} {}", word, word.to_lowercase()),
        1 => format!("{}\n{}", word, word),
        _ => word,
    }
}

fn random_strings(rng: &mut impl Rng) -> Vec<String> {
    (0..rng.gen_range(0..CONFIGURATION.maximum_number_of_elements))
        .map(|_| random_string(rng))
        .collect()
}

fn random_resume(rng: &mut impl Rng) -> Resume {
    Resume {
        name: random_string(rng),
        email: random_string(rng),
        phone: random_string(rng),
        summary: random_string(rng),
        skills: random_strings(rng),
        experience: (0..rng.gen_range(0..CONFIGURATION.maximum_number_of_elements))
            .map(|_| ExperienceItem {
                job_title: random_string(rng),
                company: random_string(rng),
                location: random_string(rng),
                duration: random_string(rng),
                bullets: random_strings(rng),
            })
            .collect(),
        education: random_string(rng),
        achievements: random_strings(rng),
    }
}

fn scenario_resume() -> Resume {
    Resume {
        name: "Jane Doe".into(),
        email: "jane@x.com".into(),
        phone: "555-0100".into(),
        summary: "Engineer.".into(),
        skills: vec!["Go".into(), "Rust".into()],
        experience: vec![ExperienceItem {
            job_title: "SWE".into(),
            company: "Acme".into(),
            location: "NY".into(),
            duration: "2020-2023".into(),
            bullets: vec!["Shipped X".into()],
        }],
        education: "BS CS".into(),
        achievements: vec!["Award".into()],
    }
}

#[test]
fn serialized_resumes_parse_back_field_for_field() {
    let mut rng = rand::thread_rng();
    for _ in 0..CONFIGURATION.resumes_to_generate {
        let resume = random_resume(&mut rng);
        let payload = serde_json::to_string(&resume).unwrap();

        similar_asserts::assert_eq!(vitae::payload::parse(&payload).unwrap(), resume);
    }
}

#[test]
fn projections_are_deterministic() {
    let mut rng = rand::thread_rng();
    for _ in 0..CONFIGURATION.resumes_to_generate {
        let resume = random_resume(&mut rng);

        assert_eq!(
            vitae::layout::render(&resume),
            vitae::layout::render(&resume.clone())
        );
        assert_eq!(
            vitae::text_export::to_plain_text(&resume),
            vitae::text_export::to_plain_text(&resume.clone())
        );
    }
}

#[test]
fn every_section_is_present_even_when_empty() {
    let resume = Resume {
        name: "Jane Doe".into(),
        ..Resume::default()
    };

    let layout = vitae::layout::render(&resume);
    let kinds: Vec<_> = layout.sections.iter().map(|section| section.kind).collect();
    assert_eq!(kinds, SectionKind::ORDER.to_vec());

    let text = vitae::text_export::to_plain_text(&resume);
    let mut position = 0;
    for title in SectionKind::ORDER.iter().filter_map(|kind| kind.title()) {
        let found = text[position..]
            .find(title)
            .unwrap_or_else(|| panic!("{:?} is missing from {:?}", title, text));
        position += found + title.len();
    }
}

#[test]
fn plain_text_of_the_scenario_resume() {
    let text = vitae::text_export::to_plain_text(&scenario_resume());

    assert!(text.starts_with("Jane Doe\nEmail: jane@x.com | Phone: 555-0100"));
    assert!(text.contains("SWE at Acme, NY (2020-2023)\n- Shipped X"));
}

#[test]
fn malformed_payloads_end_in_the_load_failed_state() {
    assert!(matches!(
        vitae::payload::parse("{not json"),
        Err(ResumeError::MalformedPayload(_))
    ));

    let page = ResultPage::open(
        Some("{not json".into()),
        vitae::payload::PayloadParser::default(),
        Arc::new(BlockPainter),
    );
    assert_eq!(page.view().message(), Some(LOAD_FAILED_MESSAGE));
    assert_eq!(page.view().controls().len(), 1);
    assert_eq!(page.view().controls()[0].kind, ControlKind::GoBack);
}

#[test]
fn missing_payloads_end_in_the_no_resume_state() {
    let page = ResultPage::open(
        None,
        vitae::payload::PayloadParser::default(),
        Arc::new(BlockPainter),
    );

    assert!(matches!(page.view(), ResultView::NoResume { .. }));
    assert_eq!(page.view().message(), Some(NO_RESUME_MESSAGE));
    assert_eq!(page.view().controls().len(), 1);
    assert_eq!(page.view().controls()[0].kind, ControlKind::GoBack);
}

#[test]
fn copying_twice_rearms_a_single_acknowledgment() {
    let payload = serde_json::to_string(&scenario_resume()).unwrap();
    let mut page = ResultPage::open(
        Some(payload),
        vitae::payload::PayloadParser::default(),
        Arc::new(BlockPainter),
    )
    .with_clipboard_exporter(vitae::text_export::ClipboardExporter::new(
        Duration::from_secs(2),
    ));
    let mut clipboard = MemoryClipboard::default();
    let start = Instant::now();

    page.copy_to_clipboard(&mut clipboard, start)
        .unwrap()
        .unwrap();
    page.copy_to_clipboard(&mut clipboard, start + Duration::from_secs(1))
        .unwrap()
        .unwrap();

    assert_eq!(clipboard.writes, 2);
    assert_eq!(
        page.copy_acknowledgment(start + Duration::from_millis(2500)),
        Some(COPY_ACKNOWLEDGMENT_MESSAGE)
    );
    assert_eq!(
        page.copy_acknowledgment(start + Duration::from_millis(3000)),
        None
    );
}

#[tokio::test]
async fn the_rendered_page_exports_a_named_document() {
    let payload = serde_json::to_string(&scenario_resume()).unwrap();
    let mut page = ResultPage::open(
        Some(payload),
        vitae::payload::PayloadParser::default(),
        Arc::new(BlockPainter),
    );
    let mut downloads = MemoryDownloads::default();

    let outcome = page.export_document(&mut downloads).await.unwrap().unwrap();

    let ExportOutcome::Downloaded(download) = outcome else {
        panic!("the export was refused");
    };
    assert_eq!(download.filename, "Jane_Doe_Resume.pdf");
    assert!(download.bytes.starts_with(b"%PDF"));
    assert_eq!(downloads.downloads.len(), 1);

    let view = page.view().rendered_view().unwrap();
    assert!(view.layout().controls.iter().all(|control| control.visible));
    let skills = view.layout().section(SectionKind::Skills).unwrap();
    assert_eq!(
        skills.blocks,
        vec![Block::Tags(vec!["Go".into(), "Rust".into()])]
    );
}
