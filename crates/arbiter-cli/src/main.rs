//! Arbiter command-line interface.
//!
//! Attribute-based access decisions for principals and resources.
//!
//! # Quick Start
//!
//! ```bash
//! # Evaluate a request locally against a policy file
//! arbiter eval --policy policies.json -p role=admin -r classification=confidential -a access
//!
//! # Ask a running decision service
//! arbiter check --endpoint http://localhost:8000 --principal-uri user-1 --resource-uri doc-1
//!
//! # Register an entity and create a policy
//! arbiter entity register --type resource --uri doc-1 classification=confidential
//! arbiter policy create policies.json
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use arbiter_types::{AttributeValue, EntityType};
use clap::{Parser, Subcommand};

use commands::{GlobalArgs, RequestArgs, parse_attribute};

/// Arbiter - attribute-based access decisions.
#[derive(Parser)]
#[command(name = "arbiter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Decide a request locally against policy files.
    Eval {
        /// Policy document (JSON policy or array). Defaults to policies.files.
        #[arg(long = "policy", value_name = "FILE")]
        policies: Vec<PathBuf>,

        /// JSON array of entities to register before evaluating.
        #[arg(long = "entities", value_name = "FILE")]
        entities: Vec<PathBuf>,

        #[command(flatten)]
        request: RequestArgs,

        /// Print the decision as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask the decision service whether a request is allowed.
    Check {
        #[command(flatten)]
        request: RequestArgs,

        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Entity registry commands.
    #[command(subcommand)]
    Entity(EntityCommands),

    /// Policy administration commands.
    #[command(subcommand)]
    Policy(PolicyCommands),

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum EntityCommands {
    /// Register a new entity.
    Register {
        /// Entity type (principal, resource, any).
        #[arg(short = 't', long = "type", default_value = "any")]
        entity_type: EntityType,

        /// URI to register under (generated if omitted).
        #[arg(short, long)]
        uri: Option<String>,

        /// Attributes as key=value.
        #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, AttributeValue)>,
    },

    /// Show a registered entity.
    Get {
        /// Entity URI.
        uri: String,
    },

    /// Update attributes of a registered entity.
    Update {
        /// Entity URI.
        uri: String,

        /// Attributes as key=value.
        #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, AttributeValue)>,

        /// Replace all attributes instead of merging.
        #[arg(long = "override")]
        override_all: bool,
    },

    /// Delete a registered entity.
    Delete {
        /// Entity URI.
        uri: String,
    },

    /// List registered entities.
    List {
        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// List policies.
    List {
        /// Print the policies as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create policies from a JSON document.
    Create {
        /// Policy document (JSON policy or array).
        file: PathBuf,
    },

    /// Create a single-rule allow policy from a request.
    Simple {
        /// Policy name.
        name: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Delete a policy by name.
    Delete {
        /// Policy name.
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Output format (text, toml, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so command output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.global.no_color);

    if matches!(cli.command, Commands::Version) {
        commands::version::run();
        return Ok(());
    }

    let config = cli.global.load_config()?;

    match cli.command {
        Commands::Version => Ok(()),
        Commands::Eval {
            policies,
            entities,
            request,
            json,
        } => commands::eval::run(&config, &policies, &entities, &request, json),
        Commands::Check { request, json } => commands::check::run(&config, &request, json),
        Commands::Entity(cmd) => match cmd {
            EntityCommands::Register {
                entity_type,
                uri,
                attributes,
            } => commands::entity::register(&config, entity_type, uri, &attributes),
            EntityCommands::Get { uri } => commands::entity::get(&config, &uri),
            EntityCommands::Update {
                uri,
                attributes,
                override_all,
            } => commands::entity::update(&config, &uri, &attributes, override_all),
            EntityCommands::Delete { uri } => commands::entity::delete(&config, &uri),
            EntityCommands::List { offset, limit } => {
                commands::entity::list(&config, offset, limit)
            }
        },
        Commands::Policy(cmd) => match cmd {
            PolicyCommands::List { json } => commands::policy::list(&config, json),
            PolicyCommands::Create { file } => commands::policy::create(&config, &file),
            PolicyCommands::Simple { name, request } => {
                commands::policy::simple(&config, &name, &request)
            }
            PolicyCommands::Delete { name } => commands::policy::delete(&config, &name),
        },
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { format } => commands::config::show(&config, &format),
        },
    }
}
