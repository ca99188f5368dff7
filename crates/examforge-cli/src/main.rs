//! examforge CLI: author, store, and render English tests.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "examforge", version, about = "English test authoring toolkit")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and a sample test document
    Init,

    /// Start an empty test document
    New {
        #[arg(long)]
        title: String,

        /// Curriculum id the test is built from
        #[arg(long, requires = "unit")]
        curriculum: Option<String>,

        /// Unit id within the curriculum
        #[arg(long, requires = "curriculum")]
        unit: Option<String>,

        /// Output JSON file
        #[arg(long)]
        output: PathBuf,
    },

    /// Check a test document for consistency problems
    Validate {
        /// Path to a test JSON file
        #[arg(long)]
        test: PathBuf,

        /// Also flag inline payloads, as for a stored document
        #[arg(long)]
        stored: bool,
    },

    /// Save a test document, externalizing its inline assets
    Save {
        /// Path to a test JSON file
        #[arg(long)]
        test: PathBuf,

        /// Save under this id (merges into an existing test)
        #[arg(long)]
        id: Option<String>,

        /// JSON array of edits to apply before saving
        #[arg(long)]
        edits: Option<PathBuf>,
    },

    /// List saved tests, newest first
    List,

    /// Show a saved test
    Show {
        #[arg(long)]
        id: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Delete a saved test and its assets
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Browse the curriculum knowledge base
    Knowledge {
        /// Curriculum id (lists curricula when omitted)
        #[arg(long)]
        curriculum: Option<String>,

        /// Unit id within the curriculum
        #[arg(long)]
        unit: Option<String>,

        /// Include every unit up to and including --unit
        #[arg(long)]
        cumulative: bool,
    },

    /// Render a test as a printable HTML worksheet
    Render {
        /// Id of a saved test
        #[arg(long, conflicts_with = "test", required_unless_present = "test")]
        id: Option<String>,

        /// Path to a test JSON file
        #[arg(long)]
        test: Option<PathBuf>,

        /// Output HTML file
        #[arg(long)]
        output: PathBuf,

        /// Include answers
        #[arg(long)]
        answer_key: bool,
    },

    /// Scramble the words of a sentence for a word-order question
    Shuffle {
        #[arg(long)]
        sentence: String,

        /// Shuffle locally instead of asking the model
        #[arg(long)]
        local: bool,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,
    },

    /// Generate a reading passage
    GeneratePassage {
        #[arg(long)]
        topic: String,

        /// Passage length: short, medium, long
        #[arg(long, default_value = "medium")]
        length: String,

        /// Curriculum id for vocabulary constraints
        #[arg(long, requires = "unit")]
        curriculum: Option<String>,

        /// Unit id for vocabulary constraints
        #[arg(long, requires = "curriculum")]
        unit: Option<String>,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,
    },

    /// Generate comprehension questions about a passage
    GenerateQuestions {
        /// File containing the passage text
        #[arg(long)]
        passage_file: PathBuf,

        /// Question type: mcq, fib, true-false
        #[arg(long = "type", default_value = "mcq")]
        question_type: String,

        #[arg(long, default_value = "0")]
        easy: u32,

        #[arg(long, default_value = "0")]
        medium: u32,

        #[arg(long, default_value = "0")]
        hard: u32,

        #[arg(long, requires = "unit")]
        curriculum: Option<String>,

        #[arg(long, requires = "curriculum")]
        unit: Option<String>,

        /// Append the questions to a reading part of this test file
        #[arg(long, requires = "part")]
        test: Option<PathBuf>,

        /// Reading part id to append to
        #[arg(long, requires = "test")]
        part: Option<u64>,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::New {
            title,
            curriculum,
            unit,
            output,
        } => commands::new::execute(title, curriculum, unit, output),
        Commands::Validate { test, stored } => commands::validate::execute(test, stored),
        Commands::Save { test, id, edits } => commands::save::execute(test, id, edits, config).await,
        Commands::List => commands::list::execute(config).await,
        Commands::Show { id, format } => commands::show::execute(id, format, config).await,
        Commands::Delete { id } => commands::delete::execute(id, config).await,
        Commands::Knowledge {
            curriculum,
            unit,
            cumulative,
        } => commands::knowledge::execute(curriculum, unit, cumulative, config),
        Commands::Render {
            id,
            test,
            output,
            answer_key,
        } => commands::render::execute(id, test, output, answer_key, config).await,
        Commands::Shuffle {
            sentence,
            local,
            provider,
        } => commands::shuffle::execute(sentence, local, provider, config).await,
        Commands::GeneratePassage {
            topic,
            length,
            curriculum,
            unit,
            provider,
        } => {
            commands::generate_passage::execute(topic, length, curriculum, unit, provider, config)
                .await
        }
        Commands::GenerateQuestions {
            passage_file,
            question_type,
            easy,
            medium,
            hard,
            curriculum,
            unit,
            test,
            part,
            provider,
        } => {
            commands::generate_questions::execute(commands::generate_questions::Args {
                passage_file,
                question_type,
                easy,
                medium,
                hard,
                curriculum,
                unit,
                test,
                part,
                provider,
                config,
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
