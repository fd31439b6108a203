use clap::Parser;
use serde::Serialize;
use std::fmt::Write as _;
use transfer_progress::adapters::transcript::{self, Transcript};
use transfer_progress::utils::error::ErrorCategory;
use transfer_progress::utils::validation::{validate_required_field, Validate};
use transfer_progress::utils::logger;
use transfer_progress::{
    AgreementKey, CliConfig, EngineConfig, IndexEntry, LocalDocumentStore, ProgressEngine,
    ProgressError, ProgressReport,
};

#[derive(Serialize)]
struct Output<'a> {
    evaluated_at: chrono::DateTime<chrono::Utc>,
    detected_college: Option<&'a str>,
    student_courses: usize,
    report: &'a ProgressReport,
}

fn exit_with(e: &ProgressError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    let code = match e.category() {
        ErrorCategory::Document => 2,
        ErrorCategory::Input | ErrorCategory::Configuration => 1,
    };
    std::process::exit(code);
}

fn render_text(report: &ProgressReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.program.as_deref().unwrap_or("Program"));
    if let Some(url) = &report.context.source_url {
        let _ = writeln!(out, "  {}", url);
    }
    let _ = writeln!(
        out,
        "Progress: {}% ({}/{} groups satisfied, {}% of listed courses)",
        report.progress_percentage,
        report.satisfied_groups,
        report.total_groups,
        report.course_progress_percentage
    );
    for group in &report.group_results {
        let _ = writeln!(
            out,
            "  {} {}: {}/{}",
            if group.satisfied { "✓" } else { "✗" },
            group.title.as_deref().unwrap_or(&group.group_id),
            group.completed_count,
            group.required_count
        );
    }
    if !report.missing_required.is_empty() {
        let _ = writeln!(out, "Still needed:");
        for entry in &report.missing_required {
            let _ = match &entry.can_be_satisfied_by {
                Some(options) => writeln!(
                    out,
                    "  - {} {} (take {})",
                    entry.course_code, entry.course_name, options
                ),
                None => writeln!(out, "  - {}: {}", entry.course_code, entry.course_name),
            };
        }
    }
    out
}

async fn evaluate(
    cli: &CliConfig,
    config: &EngineConfig,
    transcript: &Transcript,
) -> transfer_progress::Result<ProgressReport> {
    let engine = ProgressEngine::new(config.evaluation.clone());

    if let Some(path) = &cli.document {
        let bytes = tokio::fs::read(path).await?;
        let document: serde_json::Value = serde_json::from_slice(&bytes)?;
        return engine.evaluate(&document, cli.program.as_deref(), &transcript.courses);
    }

    let raw_key = validate_required_field("--key", &cli.key)?;
    let key = AgreementKey::parse(raw_key)?;
    let store = LocalDocumentStore::new(&config.documents.root);
    engine
        .evaluate_key(&store, &key, &transcript.courses)
        .await
}

async fn print_index(cli: &CliConfig) -> transfer_progress::Result<()> {
    let path = validate_required_field("--document", &cli.document)?;
    let bytes = tokio::fs::read(path).await?;
    let document: serde_json::Value = serde_json::from_slice(&bytes)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let entries = IndexEntry::from_document(file_name, &document)?;
    tracing::info!("Found {} programs in {}", entries.len(), file_name);
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match cli.engine_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let level = config.monitoring.log_level.as_deref();
    if config.monitoring.json_logs {
        logger::init_json_logger(cli.verbose, level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    if cli.index {
        if let Err(e) = print_index(&cli).await {
            exit_with(&e);
        }
        return Ok(());
    }

    let transcript = match validate_required_field("--courses", &cli.courses) {
        Ok(path) => transcript::load(path).await,
        Err(e) => Err(e),
    };
    let transcript = match transcript {
        Ok(transcript) => transcript,
        Err(e) => exit_with(&e),
    };
    tracing::info!("Loaded {} student courses", transcript.courses.len());

    let report = match evaluate(&cli, &config, &transcript).await {
        Ok(report) => report,
        Err(e) => exit_with(&e),
    };

    if config.output.format == "text" {
        print!("{}", render_text(&report));
    } else {
        let output = Output {
            evaluated_at: chrono::Utc::now(),
            detected_college: transcript.college_name.as_deref(),
            student_courses: transcript.courses.len(),
            report: &report,
        };
        let json = if config.output.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{}", json);
    }

    Ok(())
}
