use anyhow::{ensure, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use std::{env, fs};

use entity_gen::config::output_from_env;
use entity_gen::schema::{json_schema, parse_file, sample_document};
use entity_gen::{GenerationResult, GeneratorConfig};

const DEFAULT_INPUT: &str = "entities.json";

#[derive(Parser)]
#[clap(name = "Entity generator", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(long)]
    cwd: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate model, schema, router, service and repository files for every entity,
    /// plus the privileges script. Existing files at those paths are overwritten.
    Generate {
        /// Entity document (JSON array)
        input: PathBuf,
        /// Output root (defaults to ENTITY_GEN_OUTPUT or the current directory)
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Skip invalid entities instead of aborting
        #[clap(long)]
        keep_going: bool,
        #[clap(flatten)]
        mode: Mode,
        /// Do not maintain the mod.rs registry files
        #[clap(long)]
        no_registry: bool,
        /// Render everything, write nothing
        #[clap(long)]
        dry_run: bool,
        /// Print the manifest as JSON
        #[clap(long)]
        json: bool,
    },
    /// Validate an entity document
    Check {
        input: PathBuf,
        #[clap(flatten)]
        mode: Mode,
    },
    /// Write the JSON Schema of entity documents
    Schema {
        /// Output file (stdout when omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a starter entity document
    Init {
        file: Option<PathBuf>,
        /// Overwrite an existing file
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Args)]
struct Mode {
    /// Report unresolved targets and mismatched relationship pairs as warnings
    #[clap(long)]
    lenient: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = exec(cli) {
        use std::io::Write;
        use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        if cfg!(debug_assertions) {
            let _ = write!(&mut stderr, "{:?}", err);
        } else {
            let _ = write!(&mut stderr, "{:#}", err);
        }
        let _ = stderr.reset();
        let _ = writeln!(&mut stderr);
        std::process::exit(1);
    }
}

fn exec(cli: Cli) -> Result<()> {
    if let Some(ref cwd) = cli.cwd {
        env::set_current_dir(cwd)
            .with_context(|| format!("directory error!: {}", cwd.to_string_lossy()))?;
    }
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli.command {
        Commands::Generate {
            input,
            output,
            keep_going,
            mode,
            no_registry,
            dry_run,
            json,
        } => {
            let mut config = GeneratorConfig::from_env();
            config.keep_going |= keep_going;
            config.strict &= !mode.lenient;
            config.registry &= !no_registry;
            config.dry_run = dry_run;
            let output = output.unwrap_or_else(output_from_env);
            let entities = parse_file(&input)?;
            let result = entity_gen::generate(&entities, &output, &config)
                .with_context(|| format!("generation failed: {}", input.display()))?;
            report(&result, json)?;
        }
        Commands::Check { input, mode } => {
            let mut config = GeneratorConfig::from_env();
            config.strict &= !mode.lenient;
            let entities = parse_file(&input)?;
            let result = entity_gen::check(&entities, &config)
                .with_context(|| format!("check failed: {}", input.display()))?;
            println!(
                "{}: {} entities OK, {} warnings",
                input.display(),
                result.artifacts.len(),
                result.warnings.len()
            );
        }
        Commands::Schema { output } => match output {
            Some(path) => json_schema::write_schema(&path)?,
            None => println!("{}", json_schema::whole_schema()),
        },
        Commands::Init { file, force } => {
            let file = file.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
            init(&file, force)?;
        }
    }
    Ok(())
}

fn report(result: &GenerationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    for (entity, paths) in &result.artifacts {
        println!("{}", entity);
        for path in paths {
            println!("  {}", path.display());
        }
    }
    println!("{}", result.privileges.display());
    for path in &result.registry {
        println!("{}", path.display());
    }
    for skipped in &result.skipped {
        println!("skipped {}: {}", skipped.entity, skipped.reason);
    }
    Ok(())
}

fn init(file: &Path, force: bool) -> Result<()> {
    ensure!(
        force || !file.exists(),
        "{} already exists (use --force to overwrite)",
        file.display()
    );
    let content = serde_json::to_string_pretty(&sample_document())?;
    fs::write(file, content + "\n").with_context(|| format!("cannot write {}", file.display()))?;
    log::info!("wrote {}", file.display());
    Ok(())
}
