use clap::Parser;
use std::path::PathBuf;
use vitae::{
    configuration::ExportConfiguration,
    error::ResumeError,
    generation::GenerationResponse,
    snapshot::{DirectorySink, ExportOutcome},
    text_export::ClipboardSink,
    view::ResultPage,
};

#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct CliArguments {
    #[arg(
        short = 'p',
        long = "payload",
        value_name = "json_file",
        help = "Either a resume payload or the response body of the generation service"
    )]
    payload_path: Option<PathBuf>,
    #[arg(short = 'c', long = "configuration", value_name = "json_file")]
    configuration_path: Option<PathBuf>,
    #[arg(short = 'o', long = "output", value_name = "directory", default_value = ".")]
    output_directory: PathBuf,
}

/// Stands in for the system clipboard by writing the copied text next to the document.
struct TextFileClipboard {
    file_path: PathBuf,
}

impl ClipboardSink for TextFileClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ResumeError> {
        std::fs::write(&self.file_path, text).map_err(|error| {
            ResumeError::sink(
                format!("Unable to write the text to {:?}", self.file_path),
                &error,
            )
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = fallible_main().await {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

async fn fallible_main() -> Result<(), ResumeError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    let arguments = CliArguments::parse();
    log::debug!("{:?}", arguments);

    let configuration = match &arguments.configuration_path {
        Some(configuration_path) => ExportConfiguration::from_path(configuration_path)?,
        None => ExportConfiguration::default(),
    };

    let handoff = match &arguments.payload_path {
        Some(payload_path) => {
            let contents = std::fs::read_to_string(payload_path).map_err(|error| {
                ResumeError::configuration(
                    format!("Failed to read the payload file {:?}", payload_path),
                    &error,
                )
            })?;
            // Response bodies wrap the payload in a `resume` string.
            Some(GenerationResponse::decode(&contents).unwrap_or(contents))
        }
        None => None,
    };

    let mut page = ResultPage::from_configuration(handoff, &configuration)?;
    if let Some(error) = page.view().error() {
        return Err(error.clone());
    }
    if let Some(message) = page.view().message() {
        log::warn!("{}", message);
        return Ok(());
    }

    let mut clipboard = TextFileClipboard {
        file_path: arguments.output_directory.join("resume.txt"),
    };
    if let Some(result) = page.copy_to_clipboard(&mut clipboard, std::time::Instant::now()) {
        result?;
        log::info!("Saved the plain text to {:?}", clipboard.file_path);
    }

    let mut downloads = DirectorySink {
        directory: arguments.output_directory.clone(),
    };
    if let Some(result) = page.export_document(&mut downloads).await {
        if let ExportOutcome::Downloaded(download) = result? {
            log::info!(
                "Saved the document {:?} of {}x{} pixels",
                download.filename,
                download.page_size.0,
                download.page_size.1
            );
        }
    }

    Ok(())
}
