//! deckfill - Fill PPTX templates and inspect their placeholders

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deckfill::{
    DEFAULT_TEMPLATE, DirTemplateStore, Document, Report, analyze, analyze_template,
    generate_from_store, render_html,
};

#[derive(Parser)]
#[command(name = "deckfill")]
#[command(version, about = "Fill PPTX templates with placeholder values", long_about = None)]
#[command(after_help = "EXAMPLES:
    deckfill generate --title 'Q1 Report' --content 'Summary'   Fill the default template
    deckfill generate --set author=Kim -o out.pptx              Fill an extra placeholder
    deckfill analyze --html                                     Show template placeholders as HTML")]
struct Cli {
    /// Directory holding template files
    #[arg(long, global = true, value_name = "DIR", default_value = "templates")]
    templates: PathBuf,

    /// Template file name inside the template directory
    #[arg(long, global = true, value_name = "NAME", default_value = DEFAULT_TEMPLATE)]
    template: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the template and write a presentation
    Generate {
        /// Value for ${title}
        #[arg(long, default_value = "Test title")]
        title: String,

        /// Value for ${content}
        #[arg(long, default_value = "Test content.")]
        content: String,

        /// Additional placeholder value
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Output file
        #[arg(short, long, value_name = "OUTPUT", default_value = "test_report.pptx")]
        output: PathBuf,

        /// Suppress output messages
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the structure and placeholders of the template
    Analyze {
        /// Wrap the report in an HTML page
        #[arg(long, conflicts_with = "json")]
        html: bool,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deckfill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = DirTemplateStore::new(&cli.templates);

    match cli.command {
        Command::Generate {
            title,
            content,
            set,
            output,
            quiet,
        } => {
            let mut map = Report::new(title, content).to_substitution_map();
            map.extend(set);
            match generate(&store, &cli.template, &map, &output) {
                Ok(size) => {
                    if !quiet {
                        println!("Wrote {} ({size} bytes)", output.display());
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Analyze { html, json } => {
            if json {
                println!("{}", analyze_json(&store, &cli.template));
            } else {
                let report = analyze_template(&store, &cli.template);
                if html {
                    println!("{}", render_html(&report));
                } else {
                    print!("{report}");
                }
            }
            ExitCode::SUCCESS
        }
    }
}

fn generate(
    store: &DirTemplateStore,
    template: &str,
    map: &deckfill::SubstitutionMap,
    output: &Path,
) -> Result<usize, String> {
    let pptx = generate_from_store(store, template, map).map_err(|e| e.to_string())?;
    std::fs::write(output, &pptx).map_err(|e| e.to_string())?;
    Ok(pptx.len())
}

fn analyze_json(store: &DirTemplateStore, template: &str) -> String {
    let value = match Document::open(store, template) {
        Ok(document) => serde_json::to_value(analyze(&document))
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
