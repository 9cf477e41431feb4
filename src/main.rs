//! Match outcome prediction CLI
//!
//! Searches a hyperparameter grid for a three-way outcome classifier and
//! predicts home win / draw / away win percentages.

use clap::{Parser, Subcommand};
use outcome::{Config, Result};

#[derive(Parser)]
#[command(name = "outcome")]
#[command(about = "Three-way match outcome prediction with parallel grid search", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List leagues in a dataset
    Leagues {
        /// Match history CSV
        #[arg(long, default_value = "data/matches.csv")]
        data: String,
    },
    /// List the home teams of a league
    Teams {
        /// Match history CSV
        #[arg(long, default_value = "data/matches.csv")]
        data: String,
        /// League name as written in the dataset
        #[arg(long)]
        league: String,
    },
    /// Search the hyperparameter grid and persist the best model
    Train {
        /// Match history CSV
        #[arg(long, default_value = "data/matches.csv")]
        data: String,
        /// Domain tag the model is stored under
        #[arg(long, default_value = "football")]
        domain: String,
        /// Override number of concurrent trials
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Predict a fixture with a persisted model
    Predict {
        /// Home team name
        home: String,
        /// Away team name
        away: String,
        /// Match history CSV
        #[arg(long, default_value = "data/matches.csv")]
        data: String,
        /// Domain tag of the model to use
        #[arg(long, default_value = "football")]
        domain: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show the persisted model for a domain
    Info {
        #[arg(long, default_value = "football")]
        domain: String,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Leagues { data } => commands::leagues(&data),
        Commands::Teams { data, league } => commands::teams(&data, &league),
        Commands::Train {
            data,
            domain,
            workers,
        } => commands::train(config, &data, &domain, workers),
        Commands::Predict {
            home,
            away,
            data,
            domain,
            format,
        } => commands::predict(config, &data, &domain, &home, &away, format),
        Commands::Model { action } => match action {
            ModelCommands::Info { domain } => commands::model_info(&config, &domain),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.kind(), e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use outcome::data::RecordSet;
    use outcome::model::ModelStore;
    use outcome::predict::format_prediction;
    use outcome::Session;

    type MyBackend = Autodiff<NdArray<f32>>;

    fn session(config: Config) -> Session<MyBackend> {
        let store = ModelStore::new(&config.data.model_dir);
        Session::new(config, Default::default()).with_store(store)
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all(&config.data.model_dir)?;
        println!("Created data/ and {}/ directories", config.data.model_dir);

        println!("\nNext steps:");
        println!("  1. Put match history in data/matches.csv");
        println!("     (columns: HomeTeam, AwayTeam, Result, HomeGoals, AwayGoals, League)");
        println!("  2. Run 'outcome train --domain football' to search and train");
        println!("  3. Run 'outcome predict \"Team A\" \"Team B\"' to make predictions");

        Ok(())
    }

    pub fn leagues(data: &str) -> Result<()> {
        let records = RecordSet::load_csv(data)?;

        println!("Dataset: {} ({} matches)", data, records.len());
        if let Some((first, last)) = records.date_range() {
            println!("Dates:   {} to {}", first, last);
        }
        println!("───────────────────────────────");
        for league in records.leagues() {
            println!("  {:<24} {:>3} teams", league, records.list_teams(&league).len());
        }

        Ok(())
    }

    pub fn teams(data: &str, league: &str) -> Result<()> {
        let records = RecordSet::load_csv(data)?;
        let teams = records.list_teams(league);

        if teams.is_empty() {
            println!("No teams found for league '{}'", league);
            return Ok(());
        }
        for team in teams {
            println!("{}", team);
        }

        Ok(())
    }

    pub fn train(mut config: Config, data: &str, domain: &str, workers: Option<usize>) -> Result<()> {
        if let Some(w) = workers {
            config.search.workers = w;
            config.validate()?;
        }

        println!(
            "Searching {} candidates with {} workers...",
            config.grid.size(),
            config.search.workers
        );

        let mut session = session(config);
        session.load_dataset(data)?;
        let report = session.train(domain)?;

        println!("\nSearch results");
        println!("────────────────────────────────────────────────────────────────────");
        for trial in &report.trials {
            let marker = if trial.ordinal == report.best_ordinal { "*" } else { " " };
            match (trial.validation_accuracy, &trial.error) {
                (Some(acc), _) => println!(
                    "{} #{:<3} {:<52} {:>6.2}%",
                    marker,
                    trial.ordinal,
                    trial.config.to_string(),
                    acc * 100.0
                ),
                (None, Some(error)) => println!(
                    "  #{:<3} {:<52} FAILED: {}",
                    trial.ordinal,
                    trial.config.to_string(),
                    error
                ),
                (None, None) => {}
            }
        }

        if let Some(active) = session.active() {
            println!(
                "\nBest: {} (validation accuracy {:.2}%)",
                active.config,
                active.validation_accuracy * 100.0
            );
            println!(
                "Saved '{}' model to {}",
                active.domain,
                session.config().data.model_dir
            );
        }
        if report.failed() > 0 {
            println!("{} of {} trials failed", report.failed(), report.trials.len());
        }

        Ok(())
    }

    pub fn predict(
        config: Config,
        data: &str,
        domain: &str,
        home: &str,
        away: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let mut session = session(config);
        session.load_dataset(data)?;
        session.load(domain)?;

        let prediction = session.predict(home, away)?;

        match format {
            OutputFormat::Table => print!("{}", format_prediction(&prediction)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&prediction).map_err(|e| {
                    outcome::PredictorError::Model(format!("Failed to serialize prediction: {}", e))
                })?;
                println!("{}", json);
            }
        }

        Ok(())
    }

    pub fn model_info(config: &Config, domain: &str) -> Result<()> {
        let store = ModelStore::new(&config.data.model_dir);
        let manifest = store.manifest(domain)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Domain:         {}", manifest.domain);
        println!("  Directory:      {}", store.root().display());
        println!("  Hidden layers:  {}", manifest.config.num_layers);
        println!("  Units:          {}", manifest.config.units);
        println!("  Activation:     {}", manifest.config.activation);
        println!("  Learning rate:  {}", manifest.config.learning_rate);
        println!("  Epochs:         {}", manifest.config.epochs);
        println!("  Val accuracy:   {:.2}%", manifest.validation_accuracy * 100.0);
        println!("  Trained at:     {}", manifest.trained_at.format("%Y-%m-%d %H:%M UTC"));

        Ok(())
    }
}
