//! EBD questionnaire CLI
//!
//! Processes one lesson PDF: finds it, extracts and parses its questions,
//! saves them to the backend and prints a report.

use std::error::Error as _;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use async_trait::async_trait;
use clap::Parser;
use ebd_ingest::{
    error::{AppError, Result},
    extract::PdfExtractor,
    models::{Config, Environment},
    pipeline::{self, Confirmation, RunRequest},
    storage::{QuestionnaireStore, SupabaseStore},
    utils::console,
};

const EXIT_INTERRUPTED: u8 = 130;
const ENV_EXAMPLE_FILE: &str = ".env.exemplo";

/// EBD - PDF questionnaire ingestion
#[derive(Parser, Debug)]
#[command(
    name = "ebd",
    version,
    about = "Processa questionários EBD em PDF e atribui as perguntas aos membros"
)]
struct Cli {
    /// E-mail of the user running the import (default from configuration)
    #[arg(long)]
    usuario: Option<String>,

    /// PDF to process (skips the folder search)
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Folder searched for a PDF when --pdf is not given
    #[arg(long)]
    pasta: Option<PathBuf>,

    /// Parse only; never contact the backend
    #[arg(long)]
    no_save: bool,

    /// Show configuration and validate it, then exit
    #[arg(long)]
    config: bool,

    /// Execution environment preset
    #[arg(long, value_enum, default_value_t = Environment::Producao)]
    ambiente: Environment,

    /// Optional TOML file with configuration overrides
    #[arg(long, default_value = "ebd.toml")]
    arquivo_config: PathBuf,

    /// Write an example .env file and exit
    #[arg(long)]
    criar_env: bool,
}

/// Initialize logging from the configured level and debug flag.
fn init_logging(config: &Config) {
    let level = if config.runtime.debug {
        "debug".to_string()
    } else {
        config.runtime.log_level.to_lowercase()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    console::init(&config.runtime.log_level);
}

/// Confirmation read from stdin. Only `n`, `no` and `não` cancel.
struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
            print!("{prompt} [S/n]: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e)))??;

        Ok(!matches!(
            answer.trim().to_lowercase().as_str(),
            "n" | "no" | "não"
        ))
    }
}

async fn execute(cli: &Cli, config: &Config) -> Result<ExitCode> {
    let report = config.validate();
    if !report.is_ok() {
        for problem in &report.problems {
            console::error(problem);
        }
        console::error("Configuração inválida. Use --config para verificar");
        return Ok(ExitCode::FAILURE);
    }

    let request = RunRequest {
        pdf: cli.pdf.clone(),
        folder: cli
            .pasta
            .clone()
            .unwrap_or_else(|| config.folders.search.clone()),
        user: cli
            .usuario
            .clone()
            .unwrap_or_else(|| config.runtime.default_user.clone()),
        environment: cli.ambiente,
    };
    let store = if cli.no_save {
        None
    } else {
        Some(SupabaseStore::from_config(config)?)
    };

    let outcome = pipeline::execute(
        config,
        &request,
        &PdfExtractor,
        store.as_ref().map(|s| s as &dyn QuestionnaireStore),
        &StdinConfirmation,
    )
    .await?;
    Ok(ExitCode::from(outcome.exit_code()))
}

async fn run(cli: Cli) -> ExitCode {
    if cli.criar_env {
        return match Config::write_env_example(ENV_EXAMPLE_FILE) {
            Ok(()) => {
                println!(
                    "Arquivo {ENV_EXAMPLE_FILE} criado. Copie para .env e preencha os valores."
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Falha ao criar {ENV_EXAMPLE_FILE}: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let config = Config::from_env(&cli.arquivo_config, cli.ambiente);
    init_logging(&config);
    log::debug!("Effective configuration: {:?}", config);

    if cli.config {
        config.show();
        let report = config.validate();
        if report.is_ok() {
            console::success("Sistema pronto para uso!");
            return ExitCode::SUCCESS;
        }
        for problem in &report.problems {
            console::error(problem);
        }
        console::error("Configure as variáveis de ambiente antes de usar");
        return ExitCode::FAILURE;
    }

    match execute(&cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            console::error(&format!("ERRO FATAL: {e}"));
            if e.is_input() {
                console::sub_item("Confira o caminho e o conteúdo do PDF informado");
            }
            if config.runtime.debug {
                let mut source = e.source();
                while let Some(cause) = source {
                    console::error(&format!("  causado por: {cause}"));
                    source = cause.source();
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tokio::select! {
        code = run(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            console::warn("Processamento interrompido pelo usuário");
            // a pending confirmation prompt would keep the runtime alive
            std::process::exit(i32::from(EXIT_INTERRUPTED))
        }
    }
}
