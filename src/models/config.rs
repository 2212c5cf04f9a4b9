//! Application configuration structures.
//!
//! A [`Config`] is built once at start-up from three layers, lowest first:
//! built-in defaults, an optional TOML file, the selected [`Environment`]
//! preset and finally environment variables (a `.env` file is honoured).
//! The resulting value is passed by reference to every component.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Segment;
use crate::utils::console;

/// Placeholder shipped in example files; never a usable backend.
pub const PLACEHOLDER_BACKEND_URL: &str = "https://seu-projeto.supabase.co";

/// Named execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Producao,
    Desenvolvimento,
    Teste,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Producao => "producao",
            Environment::Desenvolvimento => "desenvolvimento",
            Environment::Teste => "teste",
        }
    }

    /// Whether the run must be confirmed interactively.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Environment::Producao)
    }

    fn preset(&self) -> Preset {
        match self {
            Environment::Producao => Preset {
                debug: false,
                log_level: "INFO",
                min_confidence: 0.8,
            },
            Environment::Desenvolvimento => Preset {
                debug: true,
                log_level: "DEBUG",
                min_confidence: 0.6,
            },
            Environment::Teste => Preset {
                debug: true,
                log_level: "DEBUG",
                min_confidence: 0.5,
            },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Preset {
    debug: bool,
    log_level: &'static str,
    min_confidence: f64,
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hosted backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Search and working folders
    #[serde(default)]
    pub folders: FolderConfig,

    /// Question extraction rules and thresholds
    #[serde(default)]
    pub parsing: ParsingConfig,

    /// Member categorization keywords
    #[serde(default)]
    pub categories: CategoryConfig,

    /// Logical name to backend table mapping
    #[serde(default)]
    pub tables: TableConfig,

    /// Debug flags, users and input limits
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    ///
    /// A missing file is the normal case and is not reported.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
            Self::default()
        })
    }

    /// Build the configuration from every source, reading process environment
    /// variables (after loading `.env` when present).
    pub fn from_env(path: impl AsRef<Path>, environment: Environment) -> Self {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env loaded: {}", e);
        }
        Self::from_sources(path, environment, |key| std::env::var(key).ok())
    }

    /// Build the configuration using `lookup` for environment variables.
    pub fn from_sources<F>(path: impl AsRef<Path>, environment: Environment, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_or_default(path);
        config.apply_environment(environment);
        config.apply_env_overrides(lookup);
        config
    }

    /// Apply the preset of a named environment.
    pub fn apply_environment(&mut self, environment: Environment) {
        let preset = environment.preset();
        self.runtime.environment = Some(environment);
        self.runtime.debug = preset.debug;
        self.runtime.log_level = preset.log_level.to_string();
        self.parsing.min_confidence = preset.min_confidence;
    }

    /// Override settings from environment variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = var("SUPABASE_URL") {
            self.backend.url = v;
        }
        if let Some(v) = var("SUPABASE_SERVICE_KEY") {
            self.backend.service_key = v;
        }
        if let Some(v) = var("SUPABASE_ANON_KEY") {
            self.backend.anon_key = v;
        }
        if let Some(v) = var("PASTA_AUTOMACOES") {
            self.folders.search = PathBuf::from(v);
        }
        if let Some(v) = var("PASTA_LOGS") {
            self.folders.logs = PathBuf::from(v);
        }
        if let Some(v) = var("PASTA_BACKUP") {
            self.folders.backup = PathBuf::from(v);
        }
        if let Some(v) = var("PASTA_TEMP") {
            self.folders.temp = PathBuf::from(v);
        }
        if let Some(v) = var("DEBUG") {
            match parse_flag(&v) {
                Some(flag) => self.runtime.debug = flag,
                None => log::warn!("Ignoring DEBUG={v}: expected true/false"),
            }
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.runtime.log_level = v.to_uppercase();
        }
    }

    /// Check required settings and create working folders.
    pub fn validate(&self) -> ValidationReport {
        let mut problems = Vec::new();

        let url = self.backend.url.trim();
        if url.is_empty() || url == PLACEHOLDER_BACKEND_URL {
            problems.push("SUPABASE_URL não configurada".to_string());
        } else if let Err(e) = url::Url::parse(url) {
            problems.push(format!("SUPABASE_URL inválida: {e}"));
        }
        if self.backend.service_key.trim().is_empty() {
            problems.push("SUPABASE_SERVICE_KEY não configurada".to_string());
        }
        if self.backend.timeout_secs == 0 {
            problems.push("backend.timeout_secs deve ser > 0".to_string());
        }
        if self.backend.batch_size == 0 {
            problems.push("backend.batch_size deve ser > 0".to_string());
        }

        for (name, value) in [
            ("parsing.min_confidence", self.parsing.min_confidence),
            ("parsing.section_break_confidence", self.parsing.section_break_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                problems.push(format!("{name} deve estar entre 0 e 1 (atual: {value})"));
            }
        }

        for rule in &self.parsing.sections {
            for pattern in &rule.patterns {
                if let Err(e) = Regex::new(pattern) {
                    problems.push(format!("Padrão de seção inválido '{pattern}': {e}"));
                }
            }
        }
        if self.parsing.question_patterns.is_empty() {
            problems.push("Nenhum padrão de pergunta configurado".to_string());
        }
        for pattern in &self.parsing.question_patterns {
            match Regex::new(pattern) {
                Ok(re) if re.captures_len() < 3 => problems.push(format!(
                    "Padrão de pergunta '{pattern}' precisa de dois grupos (número e texto)"
                )),
                Ok(_) => {}
                Err(e) => problems.push(format!("Padrão de pergunta inválido '{pattern}': {e}")),
            }
        }

        for dir in [&self.folders.logs, &self.folders.backup, &self.folders.temp] {
            if let Err(e) = fs::create_dir_all(dir) {
                problems.push(format!("Erro ao criar pasta {}: {e}", dir.display()));
            }
        }

        ValidationReport { problems }
    }

    /// Non-secret settings as label/value pairs.
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        let users = self
            .runtime
            .test_users
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        vec![
            (
                "Ambiente",
                self.runtime
                    .environment
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "padrão".to_string()),
            ),
            ("Supabase URL", self.backend.url.clone()),
            ("Pasta Automações", self.folders.search.display().to_string()),
            ("Pasta Logs", self.folders.logs.display().to_string()),
            ("Usuários teste", users),
            ("Máx PDF", format!("{}MB", self.runtime.max_pdf_size_mb)),
            ("Confiança mínima", self.parsing.min_confidence.to_string()),
            ("Lote de inserção", self.backend.batch_size.to_string()),
            ("Debug", self.runtime.debug.to_string()),
        ]
    }

    /// Print the current configuration without credentials.
    pub fn show(&self) {
        console::header("CONFIGURAÇÃO ATUAL");
        for (label, value) in self.summary_lines() {
            console::sub_item(&format!("• {label}: {value}"));
        }
    }

    /// Write a commented example environment file.
    pub fn write_env_example(path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, ENV_EXAMPLE)?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "sim" | "on" => Some(true),
        "0" | "false" | "no" | "nao" | "não" | "off" => Some(false),
        _ => None,
    }
}

const ENV_EXAMPLE: &str = r"# Sistema EBD - Configurações
# Copie para .env e preencha com seus dados reais

# Supabase
SUPABASE_URL=https://seu-projeto.supabase.co
SUPABASE_SERVICE_KEY=sua_chave_service_role_aqui
SUPABASE_ANON_KEY=sua_chave_anon_aqui

# Pastas
PASTA_AUTOMACOES=./automacoes
PASTA_LOGS=./logs
PASTA_BACKUP=./backup
PASTA_TEMP=./temp

# Debug
DEBUG=false
LOG_LEVEL=INFO
";

/// Outcome of [`Config::validate`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub problems: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Hosted backend connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    #[serde(default = "defaults::backend_url")]
    pub url: String,

    /// Service-role key used for all writes
    #[serde(default)]
    pub service_key: String,

    /// Anonymous key (kept for parity with the web client)
    #[serde(default)]
    pub anon_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Rows per insert call
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: defaults::backend_url(),
            service_key: String::new(),
            anon_key: String::new(),
            timeout_secs: defaults::timeout(),
            batch_size: defaults::batch_size(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("service_key", &redact(&self.service_key))
            .field("anon_key", &redact(&self.anon_key))
            .field("timeout_secs", &self.timeout_secs)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Folder locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Where PDFs are searched when no explicit path is given
    #[serde(default = "defaults::search_dir")]
    pub search: PathBuf,

    #[serde(default = "defaults::logs_dir")]
    pub logs: PathBuf,

    #[serde(default = "defaults::backup_dir")]
    pub backup: PathBuf,

    #[serde(default = "defaults::temp_dir")]
    pub temp: PathBuf,

    /// Where `resultado_processamento_*.json` files are written
    #[serde(default = "defaults::results_dir")]
    pub results: PathBuf,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            search: defaults::search_dir(),
            logs: defaults::logs_dir(),
            backup: defaults::backup_dir(),
            temp: defaults::temp_dir(),
            results: defaults::results_dir(),
        }
    }
}

/// Heading patterns for one segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionPatterns {
    pub segment: Segment,
    pub patterns: Vec<String>,
}

/// Question extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Heading patterns per segment, tested in list order
    #[serde(default = "defaults::sections")]
    pub sections: Vec<SectionPatterns>,

    /// Regexes with two groups: ordinal and question text
    #[serde(default = "defaults::question_patterns")]
    pub question_patterns: Vec<String>,

    /// Line prefixes (case-insensitive) that start an answer
    #[serde(default = "defaults::answer_keywords")]
    pub answer_keywords: Vec<String>,

    /// Substrings (case-sensitive) marking letterhead and page furniture
    #[serde(default = "defaults::irrelevant_lines")]
    pub irrelevant_lines: Vec<String>,

    #[serde(default = "defaults::max_question_length")]
    pub max_question_length: usize,

    #[serde(default = "defaults::max_answer_length")]
    pub max_answer_length: usize,

    /// Parse confidence below this is reported as suspect
    #[serde(default = "defaults::min_confidence")]
    pub min_confidence: f64,

    /// Minimum uppercase share for a heading line to open a section
    #[serde(default = "defaults::section_break_confidence")]
    pub section_break_confidence: f64,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            sections: defaults::sections(),
            question_patterns: defaults::question_patterns(),
            answer_keywords: defaults::answer_keywords(),
            irrelevant_lines: defaults::irrelevant_lines(),
            max_question_length: defaults::max_question_length(),
            max_answer_length: defaults::max_answer_length(),
            min_confidence: defaults::min_confidence(),
            section_break_confidence: defaults::section_break_confidence(),
        }
    }
}

/// Keywords granting a segment to a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentKeywords {
    pub segment: Segment,
    pub keywords: Vec<String>,
}

/// Member categorization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "defaults::member_keywords")]
    pub rules: Vec<SegmentKeywords>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            rules: defaults::member_keywords(),
        }
    }
}

/// Backend table names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub igrejas: String,
    pub usuarios: String,
    pub membros: String,
    pub questionarios: String,
    pub perguntas: String,
    pub respostas: String,
    pub logs: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            igrejas: "igrejas".into(),
            usuarios: "usuarios".into(),
            membros: "membros".into(),
            questionarios: "questionarios_pdf".into(),
            perguntas: "perguntas_extraidas".into(),
            respostas: "respostas_membros".into(),
            logs: "logs_sistema".into(),
        }
    }
}

/// Runtime behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Preset applied at start-up, if any
    #[serde(default)]
    pub environment: Option<Environment>,

    /// Print full error chains on failure
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "defaults::log_level")]
    pub log_level: String,

    #[serde(default = "defaults::default_user")]
    pub default_user: String,

    #[serde(default = "defaults::test_users")]
    pub test_users: BTreeMap<String, String>,

    #[serde(default = "defaults::max_pdf_size_mb")]
    pub max_pdf_size_mb: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: None,
            debug: false,
            log_level: defaults::log_level(),
            default_user: defaults::default_user(),
            test_users: defaults::test_users(),
            max_pdf_size_mb: defaults::max_pdf_size_mb(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::{SectionPatterns, SegmentKeywords};
    use crate::models::Segment;

    // Backend defaults
    pub fn backend_url() -> String {
        super::PLACEHOLDER_BACKEND_URL.into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn batch_size() -> usize {
        100
    }

    // Folder defaults
    pub fn search_dir() -> PathBuf {
        PathBuf::from("./automacoes")
    }
    pub fn logs_dir() -> PathBuf {
        PathBuf::from("./logs")
    }
    pub fn backup_dir() -> PathBuf {
        PathBuf::from("./backup")
    }
    pub fn temp_dir() -> PathBuf {
        PathBuf::from("./temp")
    }
    pub fn results_dir() -> PathBuf {
        PathBuf::from(".")
    }

    // Parsing defaults
    pub fn sections() -> Vec<SectionPatterns> {
        let rule = |segment, patterns: &[&str]| SectionPatterns {
            segment,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        };
        vec![
            rule(
                Segment::Todos,
                &[r"PARA\s+TODOS", r"ADULTOS", r"MEMBROS\s+GERAIS"],
            ),
            rule(
                Segment::Criancas,
                &[
                    r"PARA\s+CRIANÇAS",
                    r"INTERMEDIÁRIOS",
                    r"ADOLESCENTES",
                    r"JUVENIS",
                ],
            ),
            rule(
                Segment::Acessibilidade,
                &[
                    r"PARA\s+ACESSIBILIDADE",
                    r"NECESSIDADES\s+ESPECIAIS",
                    r"INCLUSÃO",
                ],
            ),
        ]
    }
    pub fn question_patterns() -> Vec<String> {
        vec![
            r"^\s*(\d+)[\.)]\s*(.+)".into(),
            r"^(\d+)\s*[-–]\s*(.+)".into(),
            r"^\s*PERGUNTA\s+(\d+)[:\s]*(.*)".into(),
        ]
    }
    pub fn answer_keywords() -> Vec<String> {
        ["resposta:", "resp:", "r:", "solução:", "resolução:"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
    pub fn irrelevant_lines() -> Vec<String> {
        [
            "Rua Torquato",
            "CEP",
            "Telefone",
            "www.igrejacristamaranata.org",
            "IGREJA CRISTÃ MARANATA",
            "TÓPICOS DAS RESPOSTAS",
            "Página",
            "Lição",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
    pub fn max_question_length() -> usize {
        1000
    }
    pub fn max_answer_length() -> usize {
        5000
    }
    pub fn min_confidence() -> f64 {
        0.7
    }
    pub fn section_break_confidence() -> f64 {
        0.6
    }

    // Categorization defaults
    pub fn member_keywords() -> Vec<SegmentKeywords> {
        let rule = |segment, keywords: &[&str]| SegmentKeywords {
            segment,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        vec![
            rule(
                Segment::Criancas,
                &[
                    "criança",
                    "crianças",
                    "infantil",
                    "intermediário",
                    "intermediarios",
                    "intermediária",
                    "adolescente",
                    "adolescentes",
                    "teen",
                    "juvenil",
                    "juvenis",
                    "jovem",
                ],
            ),
            rule(
                Segment::Acessibilidade,
                &[
                    "acessibilidade",
                    "especial",
                    "inclusão",
                    "deficiência",
                    "limitação",
                    "adaptado",
                ],
            ),
        ]
    }

    // Runtime defaults
    pub fn log_level() -> String {
        "INFO".into()
    }
    pub fn default_user() -> String {
        "pastor@icm.com".into()
    }
    pub fn test_users() -> BTreeMap<String, String> {
        [
            ("admin", "admin@sistema.com"),
            ("pastor", "pastor@icm.com"),
            ("secretaria", "secretaria@icm.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
    pub fn max_pdf_size_mb() -> u64 {
        50
    }
}
