use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use triage_engine::utils::error::ErrorSeverity;
use triage_engine::utils::{logger, validation::Validate};
use triage_engine::{
    BackendSettings, CliConfig, Command, OfflineAnalyzer, PatientData, RiskAnalyzer,
    RiskAssessment, RiskClient, TriageError,
};

#[derive(Debug, Serialize)]
struct AnalysisReport {
    generated_at: DateTime<Utc>,
    mode: &'static str,
    assessment: RiskAssessment,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    let file_config = match config.load_file_config() {
        Ok(file_config) => file_config,
        Err(e) => exit_with(&e),
    };

    // Logging
    let verbose = config.verbose || file_config.as_ref().is_some_and(|f| f.verbose());
    if config.log_json || file_config.as_ref().is_some_and(|f| f.log_json()) {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting triage v{}", env!("CARGO_PKG_VERSION"));
    if verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = config.backend_settings(file_config.as_ref());
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }
    tracing::debug!("Backend settings: {:?}", settings);

    if let Err(e) = run(&config.command, &settings).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        exit_with(&e);
    }

    Ok(())
}

async fn run(command: &Command, settings: &BackendSettings) -> triage_engine::Result<()> {
    match command {
        Command::Analyze { patient, offline } => {
            let patient = read_patient(patient)?;

            let (mode, analyzer): (&'static str, Box<dyn RiskAnalyzer>) = if *offline {
                ("offline", Box::new(OfflineAnalyzer))
            } else {
                ("remote", Box::new(RiskClient::from_config(settings)?))
            };

            let assessment = analyzer.analyze(&patient).await;
            tracing::info!(
                "✅ {} risk ({}%) via {}, send to {}",
                assessment.level,
                assessment.confidence,
                assessment.source,
                assessment.department
            );

            print_json(&AnalysisReport {
                generated_at: Utc::now(),
                mode,
                assessment,
            })
        }
        Command::Upload { file, merge } => {
            let client = RiskClient::from_config(settings)?;
            let partial = client.upload_document_path(file).await?;
            tracing::info!("📄 Extracted fields from {}", file.display());

            match merge {
                Some(base_path) => {
                    let base = read_patient(base_path)?;
                    print_json(&partial.merge_into(base))
                }
                None => print_json(&partial),
            }
        }
        Command::Resolve => {
            let client = RiskClient::from_config(settings)?;
            let resolver = client.resolver();
            let selected = resolver.resolve().await;
            let ordered = resolver.ordered_bases().await;

            print_json(&serde_json::json!({
                "selected": selected,
                "probed_ok": resolver.resolved().is_some(),
                "ordered_bases": ordered,
            }))
        }
    }
}

fn read_patient(path: &Path) -> triage_engine::Result<PatientData> {
    tracing::debug!("Reading patient record {}", path.display());
    PatientData::from_record_file(path)
}

fn print_json<T: Serialize>(value: &T) -> triage_engine::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_with(error: &TriageError) -> ! {
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 Suggestion: {}", error.recovery_suggestion());

    let exit_code = match error.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
