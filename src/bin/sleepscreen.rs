//! Sleep Screen CLI
//!
//! Commands:
//! - sample: Screen the first row of the reference dataset
//! - upload: Screen the first row of a user-supplied CSV file
//! - questionnaire: Answer yes/no questions and screen the answers
//! - results: Show the most recent recorded results
//! - synth: Generate synthetic records from the reference dataset
//! - menu: Interactive menu (default when no command is given)

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use sleep_screen::config::Config;
use sleep_screen::ledger::{ResultLedger, SqliteLedger, DEFAULT_TAIL_LIMIT};
use sleep_screen::normalizer::{AnswerSource, Normalizer, Questionnaire, REPROMPT_MESSAGE};
use sleep_screen::oracle::ChatOracle;
use sleep_screen::pipeline::{detect_and_record, synthesize, Detection};
use sleep_screen::session::DetectionSession;
use sleep_screen::table::ReferenceTable;
use sleep_screen::types::{CanonicalRow, ResultRecord};
use sleep_screen::{ScreenError, SCREEN_VERSION};

/// Sleep Screen - sleep apnea risk screening from sleep health data
#[derive(Parser)]
#[command(name = "sleepscreen")]
#[command(version = SCREEN_VERSION)]
#[command(about = "Screen sleep health data for sleep apnea risk", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference dataset path
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Result database path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Oracle model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen the first row of the reference dataset
    Sample,

    /// Screen the first row of your own CSV file
    Upload {
        /// CSV file with a header row
        path: PathBuf,
    },

    /// Answer yes/no questions and screen the answers
    Questionnaire,

    /// Show past results, most recent first
    Results {
        /// Number of results to show
        #[arg(short, long, default_value_t = DEFAULT_TAIL_LIMIT)]
        limit: usize,
    },

    /// Generate synthetic records from the reference dataset
    Synth {
        /// Number of records to generate
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Interactive menu
    Menu,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ScreenCliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dataset) = cli.dataset {
        config.dataset_path = dataset;
    }
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(model) = cli.model {
        config.oracle.model = model;
    }
    let json = cli.json;

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Sample => {
            let table = ReferenceTable::load(&config.dataset_path)?;
            cmd_detect(&config, Normalizer::from_reference(&table)?, json)
        }
        Commands::Upload { path } => cmd_detect(&config, Normalizer::from_upload(&path)?, json),
        Commands::Questionnaire => {
            let mut answers = StdinAnswers::new();
            let row = Normalizer::from_questionnaire(&Questionnaire::default(), &mut answers)?;
            cmd_detect(&config, row, json)
        }
        Commands::Results { limit } => cmd_results(&config, limit, json),
        Commands::Synth { count, seed } => cmd_synth(&config.dataset_path, count, seed),
        Commands::Menu => cmd_menu(&config),
    }
}

fn cmd_detect(config: &Config, row: CanonicalRow, json: bool) -> Result<(), ScreenCliError> {
    let oracle = ChatOracle::new(config.oracle.clone())?;
    let ledger = SqliteLedger::open(&config.database_path)?;
    let mut session = DetectionSession::new();
    session.load(row);

    let detection = detect_and_record(&mut session, &oracle, &ledger)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
    } else {
        print_detection(&detection);
    }
    Ok(())
}

fn cmd_results(config: &Config, limit: usize, json: bool) -> Result<(), ScreenCliError> {
    let ledger = SqliteLedger::open(&config.database_path)?;
    let records = ledger.tail(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_results(&records);
    }
    Ok(())
}

fn cmd_synth(dataset: &Path, count: usize, seed: Option<u64>) -> Result<(), ScreenCliError> {
    let table = ReferenceTable::load(dataset)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let rendered = synthesize(&table, count, &mut rng)?;
    println!("Generated {} synthetic data records.", count);
    print!("{}", rendered);
    Ok(())
}

fn cmd_menu(config: &Config) -> Result<(), ScreenCliError> {
    let ledger = SqliteLedger::open(&config.database_path)?;
    let mut session = DetectionSession::new();
    let mut input = StdinAnswers::new();

    loop {
        println!();
        println!("========================");
        println!("Sleep Apnea Detector");
        println!("========================");
        println!("1. Use Sample Data File");
        println!("2. Upload Your Own Data File");
        println!("3. Answer a Few Questions");
        println!("4. Run Detection");
        println!("5. View Past Results");
        println!("6. Generate Synthetic Data");
        println!("7. Exit");

        let Some(choice) = input.ask("Select an option (1-7): ") else {
            break;
        };

        let outcome = match choice.trim() {
            "1" => ReferenceTable::load(&config.dataset_path)
                .and_then(|table| Normalizer::from_reference(&table))
                .map_err(ScreenCliError::from)
                .and_then(|row| {
                    session.load(row);
                    println!("Sample data loaded successfully.");
                    menu_detect(config, &mut session, &ledger)
                }),
            "2" => match input.ask("Enter path to your CSV file: ") {
                Some(path) => Normalizer::from_upload(Path::new(path.trim()))
                    .map(|row| {
                        session.load(row);
                        println!("File uploaded successfully.");
                    })
                    .map_err(ScreenCliError::from),
                None => break,
            },
            "3" => Normalizer::from_questionnaire(&Questionnaire::default(), &mut input)
                .map(|row| {
                    session.load(row);
                    println!("Answers recorded successfully.");
                })
                .map_err(ScreenCliError::from),
            "4" => menu_detect(config, &mut session, &ledger),
            "5" => ledger
                .recent()
                .map(|records| {
                    println!("\nPrevious Results:");
                    print_results(&records);
                })
                .map_err(ScreenCliError::from),
            "6" => match input.ask("Enter the number of synthetic data records to generate: ") {
                Some(raw) => match raw.trim().parse::<usize>() {
                    Ok(count) => cmd_synth(&config.dataset_path, count, None),
                    Err(_) => {
                        println!("[!] Please enter a whole number.");
                        Ok(())
                    }
                },
                None => break,
            },
            "7" => {
                println!("Goodbye!");
                break;
            }
            _ => {
                println!("[!] Invalid input. Try again.");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {}", CliError::from(e).message);
        }
    }

    Ok(())
}

fn menu_detect(
    config: &Config,
    session: &mut DetectionSession,
    ledger: &dyn ResultLedger,
) -> Result<(), ScreenCliError> {
    let oracle = ChatOracle::new(config.oracle.clone())?;
    println!("\n*AI* Running detection...");
    let detection = detect_and_record(session, &oracle, ledger)?;
    print_detection(&detection);
    Ok(())
}

fn print_detection(detection: &Detection) {
    println!("\nResult: {}", detection.record.result);
    match &detection.explanation {
        Ok(text) => {
            println!("\n[AI] Explanation:");
            println!("{}", text);
        }
        Err(message) => println!("Error: {}", message),
    }
}

fn print_results(records: &[ResultRecord]) {
    if records.is_empty() {
        println!("No records yet.");
        return;
    }
    for r in records {
        println!(
            "ID: {}, Method: {}, Result: {}, Time: {}",
            r.id, r.input_method, r.result, r.timestamp
        );
    }
}

/// Reads responses line by line from stdin. Prompts are echoed only when
/// stdin is a terminal.
struct StdinAnswers {
    interactive: bool,
}

impl StdinAnswers {
    fn new() -> Self {
        Self {
            interactive: atty::is(atty::Stream::Stdin),
        }
    }
}

impl AnswerSource for StdinAnswers {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        if self.interactive {
            print!("{}", prompt);
            let _ = io::stdout().flush();
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn rejected(&mut self, _response: &str) {
        println!("{}", REPROMPT_MESSAGE);
    }
}

#[derive(Debug)]
enum ScreenCliError {
    Screen(ScreenError),
    Json(serde_json::Error),
}

impl From<ScreenError> for ScreenCliError {
    fn from(e: ScreenError) -> Self {
        ScreenCliError::Screen(e)
    }
}

impl From<serde_json::Error> for ScreenCliError {
    fn from(e: serde_json::Error) -> Self {
        ScreenCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ScreenCliError> for CliError {
    fn from(e: ScreenCliError) -> Self {
        let e = match e {
            ScreenCliError::Json(e) => {
                return CliError {
                    code: "JSON_ERROR".to_string(),
                    message: e.to_string(),
                    hint: None,
                }
            }
            ScreenCliError::Screen(e) => e,
        };

        let (code, hint) = match &e {
            ScreenError::NotFound { .. } => ("NOT_FOUND", Some("Check the file path")),
            ScreenError::Parse { .. } => (
                "PARSE_ERROR",
                Some("Ensure the file is comma-separated with a header row"),
            ),
            ScreenError::EmptyTable { .. } => {
                ("EMPTY_TABLE", Some("The file needs at least one data row"))
            }
            ScreenError::EmptyDomain { .. } => (
                "EMPTY_DOMAIN",
                Some("Every column needs at least one value"),
            ),
            ScreenError::ShapeMismatch { .. } => ("SHAPE_MISMATCH", None),
            ScreenError::StoreUnavailable(_) => (
                "STORE_UNAVAILABLE",
                Some("Check the --database path and permissions"),
            ),
            ScreenError::AnswersExhausted { .. } => {
                ("INPUT_CLOSED", Some("Answer every question with yes or no"))
            }
            ScreenError::NoInput => ("NO_INPUT", Some("Choose an input method first")),
            ScreenError::NoDetection => ("NO_DETECTION", None),
            ScreenError::Oracle(_) => (
                "ORACLE_ERROR",
                Some("Check network access and the oracle endpoint"),
            ),
            ScreenError::Config(_) => (
                "CONFIG_ERROR",
                Some("Set OPENAI_API_KEY or fix the --config file"),
            ),
            ScreenError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
        };

        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}
