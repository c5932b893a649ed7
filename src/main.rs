use clap::{Parser, Subcommand};
use iopipe::cache::FilterCache;
use iopipe::config::{Config, UpdateVerb};
use iopipe::error::IopipeResult;
use iopipe::gateway::{Gateway, ObjectReference};
use iopipe::pipeline::Pipeline;
use log::LevelFilter;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iopipe", version, about = "Cross-API interoperability & data manager")]
struct Cli {
    /// Enable debugging output
    #[arg(long, global = true)]
    debug: bool,

    /// Override the filter cache root directory
    #[arg(long, global = true, value_name = "DIR")]
    cache_root: Option<PathBuf>,

    /// Override the filter registry base URL
    #[arg(long, global = true, value_name = "URL")]
    registry: Option<url::Url>,

    /// Use PUT instead of POST for remote updates
    #[arg(long, global = true)]
    put: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pipe through the given stages, output to stdout
    Exec {
        /// Stage tokens: http(s) URL, '-' for stdin, or a filter reference
        stages: Vec<String>,
    },
    /// Import a filter from a file (or stdin for '-') into the local cache
    Import {
        file: String,
        /// Tag the imported filter with a name
        #[arg(long)]
        name: Option<String>,
    },
    /// List local filters and aliases
    List,
    /// Name a cached filter
    Tag { id: String, name: String },
    /// Re-point an existing alias at another filter
    Retag { id: String, name: String },
    /// Remove a filter or alias from the local cache
    Remove { id: String },
    /// Fetch <src>, output to stdout
    Fetch { src: String },
    /// Copy from <src> to <dest>, output the recipient response
    Copy { src: String, dest: String },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    // A failed pipeline terminates with a non-zero status and prints no
    // partial result as if it were success.
    if let Err(e) = run(cli) {
        eprintln!("iopipe: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> IopipeResult<()> {
    let mut config = Config::load()?;
    if let Some(root) = cli.cache_root {
        config = config.with_cache_root(root);
    }
    if let Some(base) = cli.registry {
        config = config.with_registry_base(base);
    }
    if cli.put {
        config = config.with_update_verb(UpdateVerb::Put);
    }

    match cli.command {
        Command::Exec { stages } => {
            let mut pipeline = Pipeline::new(&config)?;
            let out = pipeline.execute(&stages)?;
            println!("{}", out);
        }
        Command::Import { file, name } => {
            let bytes = if file == "-" {
                let mut bytes = Vec::new();
                std::io::stdin().read_to_end(&mut bytes)?;
                bytes
            } else {
                std::fs::read(&file)?
            };
            let cache = FilterCache::open(&config)?;
            let id = cache.store().write(&bytes)?;
            if let Some(name) = name {
                cache.store().alias(&id, &name)?;
            }
            println!("{}", id);
        }
        Command::List => {
            let cache = FilterCache::open(&config)?;
            for name in cache.store().list()? {
                println!("{}", name);
            }
        }
        Command::Tag { id, name } => {
            FilterCache::open(&config)?.store().alias(&id, &name)?;
        }
        Command::Retag { id, name } => {
            FilterCache::open(&config)?.store().retag(&id, &name)?;
        }
        Command::Remove { id } => {
            FilterCache::open(&config)?.store().remove(&id)?;
        }
        Command::Fetch { src } => {
            let gateway = Gateway::new(config.update_verb);
            let body = gateway.read(&ObjectReference::parse(&src)?)?;
            println!("{}", body);
        }
        Command::Copy { src, dest } => {
            let gateway = Gateway::new(config.update_verb);
            let body = gateway.read(&ObjectReference::parse(&src)?)?;
            let response = gateway.update(&ObjectReference::parse(&dest)?, &body)?;
            println!("{}", response);
        }
    }
    Ok(())
}
