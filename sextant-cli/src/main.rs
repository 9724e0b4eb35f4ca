mod config_file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use sextant_core::flatmap::{self, FlatState};
use sextant_core::provider::Provider;
use sextant_core::resource::{Resource, ResourceId, Value};
use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use sextant_provider_ssm::resource_types::{find_data_source_type, find_resource_type};
use sextant_provider_ssm::{ProviderConfig, SsmProvider, data_source_types, resource_types};
use sextant_state::{
    BackendConfig, ResourceState, StateBackend, StateFile, create_backend, upgrade_state,
};

use config_file::ConfigFile;

#[derive(Parser)]
#[command(name = "sextant")]
#[command(about = "Manage AWS Systems Manager resources", long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    /// JSON configuration file with a `provider` block
    #[arg(long, global = true, env = "SEXTANT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the state file
    #[arg(long, global = true, default_value = "sextant.state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProviderArgs {
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Custom SSM/STS endpoint
    #[arg(long, global = true, env = "SEXTANT_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    #[arg(long, global = true, env = "SEXTANT_ACCOUNT_ID")]
    account_id: Option<String>,

    #[arg(long, global = true, env = "SEXTANT_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,
}

impl From<ProviderArgs> for ProviderConfig {
    fn from(args: ProviderArgs) -> Self {
        ProviderConfig {
            region: args.region,
            profile: args.profile,
            endpoint_url: args.endpoint_url,
            account_id: args.account_id,
            max_attempts: args.max_attempts,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file against the resource schemas
    Validate {
        #[arg(default_value = "sextant.json")]
        file: PathBuf,
    },
    /// Print resource and data source schemas
    Schema {
        /// Type name; all types when omitted
        name: Option<String>,
    },
    /// State file commands
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Read one resource from AWS
    Read {
        resource_type: String,
        identifier: String,
    },
    /// Read an existing resource from AWS and record it in the state file
    Import {
        resource_type: String,
        /// Block name to record it under
        name: String,
        identifier: String,
    },
    /// Resolve a data source
    Query {
        data_source: String,

        /// Query attribute as key=value (repeatable)
        #[arg(short = 'a', long = "attribute", value_parser = parse_key_value)]
        attributes: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// Print the state file
    Show,
    /// Upgrade all resources to their current schema versions
    Upgrade {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove a state lock by ID
    Unlock { lock_id: String },
    /// Forget a resource without touching it in AWS
    Rm {
        /// `<type>.<name>`
        address: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let state_path = cli.state;
    let config_path = cli.config;
    let flags = ProviderConfig::from(cli.provider);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Schema { name } => run_schema(name.as_deref()),
        Commands::State { command } => run_state_command(command, &state_path).await,
        Commands::Read {
            resource_type,
            identifier,
        } => run_read(&resource_type, &identifier, flags, config_path.as_deref()).await,
        Commands::Import {
            resource_type,
            name,
            identifier,
        } => {
            run_import(
                &resource_type,
                &name,
                &identifier,
                flags,
                config_path.as_deref(),
                &state_path,
            )
            .await
        }
        Commands::Query {
            data_source,
            attributes,
        } => run_query(&data_source, &attributes, flags, config_path.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

// =============================================================================
// Validate / Schema
// =============================================================================

fn run_validate(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;

    println!("{}", "Validating...".cyan());

    config
        .provider
        .validate()
        .map_err(|e| format!("provider: {}", e))?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }

    println!(
        "{}",
        format!(
            "✓ {} resources and {} data sources validated successfully.",
            config.resources.len(),
            config.data.len()
        )
        .green()
        .bold()
    );

    for resource in &config.resources {
        println!("  • {}", resource.id);
    }
    for query in &config.data {
        println!("  • data {}", query.id);
    }

    Ok(())
}

fn run_schema(name: Option<&str>) -> Result<(), String> {
    let Some(name) = name else {
        println!("{}", "Resources:".bold());
        for resource_type in resource_types() {
            println!(
                "  {} (schema version {})",
                resource_type.name().cyan(),
                resource_type.schema_version()
            );
        }
        println!("{}", "Data sources:".bold());
        for data_source in data_source_types() {
            println!("  {}", data_source.name().cyan());
        }
        return Ok(());
    };

    let mut found = false;
    if let Some(resource_type) = find_resource_type(name) {
        print_schema(&resource_type.schema());
        found = true;
    }
    if let Some(data_source) = find_data_source_type(name) {
        if found {
            println!();
        }
        print_schema(&data_source.schema());
        found = true;
    }

    if found {
        Ok(())
    } else {
        Err(format!("Unknown resource or data source type: {}", name))
    }
}

fn print_schema(schema: &ResourceSchema) {
    let kind = if schema.data_source {
        "data source"
    } else {
        "resource"
    };
    println!(
        "{} {} (schema version {})",
        kind,
        schema.resource_type.cyan().bold(),
        schema.version
    );
    if let Some(description) = &schema.description {
        println!("  {}", description.dimmed());
    }
    for attribute in schema.attributes.values() {
        print_attribute(attribute, 1);
    }
}

fn print_attribute(attribute: &AttributeSchema, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut flags = Vec::new();
    if attribute.required {
        flags.push("required".to_string());
    } else if attribute.computed {
        flags.push("computed".to_string());
    } else {
        flags.push("optional".to_string());
    }
    if attribute.force_new {
        flags.push("forces replacement".to_string());
    }
    if attribute.sensitive {
        flags.push("sensitive".to_string());
    }
    if let Some(default) = &attribute.default {
        flags.push(format!("default {}", default.to_json()));
    }

    let type_name = match attribute.attr_type.base() {
        AttributeType::List(inner) if matches!(inner.base(), AttributeType::Block(_)) => {
            "List<Block>".to_string()
        }
        _ => attribute.attr_type.type_name(),
    };
    println!(
        "{}{}: {} [{}]",
        indent,
        attribute.name.bold(),
        type_name,
        flags.join(", ")
    );
    if let Some(description) = &attribute.description {
        println!("{}  {}", indent, description.dimmed());
    }

    let nested = match attribute.attr_type.base() {
        AttributeType::Block(fields) => Some(fields),
        AttributeType::List(inner) => match inner.base() {
            AttributeType::Block(fields) => Some(fields),
            _ => None,
        },
        _ => None,
    };
    for field in nested.into_iter().flatten() {
        print_attribute(field, depth + 1);
    }
}

// =============================================================================
// State commands
// =============================================================================

fn state_backend(state_path: &Path) -> Result<Box<dyn StateBackend>, String> {
    create_backend(&BackendConfig::local(state_path.display().to_string())).map_err(|e| e.to_string())
}

/// Run `work` while holding the state lock
async fn with_lock<T>(
    backend: &dyn StateBackend,
    operation: &str,
    work: impl Future<Output = Result<T, String>>,
) -> Result<T, String> {
    let lock = backend
        .acquire_lock(operation)
        .await
        .map_err(|e| e.to_string())?;

    let result = work.await;

    if let Err(e) = backend.release_lock(&lock).await {
        log::warn!("failed to release lock {}: {}", lock.id, e);
        if result.is_ok() {
            return Err(format!("Failed to release lock {}: {}", lock.id, e));
        }
    }
    result
}

async fn run_state_command(command: StateCommands, state_path: &Path) -> Result<(), String> {
    let backend = state_backend(state_path)?;

    match command {
        StateCommands::Show => run_state_show(backend.as_ref()).await,
        StateCommands::Upgrade { dry_run } => run_state_upgrade(backend.as_ref(), dry_run).await,
        StateCommands::Unlock { lock_id } => {
            backend
                .force_unlock(&lock_id)
                .await
                .map_err(|e| e.to_string())?;
            println!("{}", format!("Lock {} removed.", lock_id).green());
            Ok(())
        }
        StateCommands::Rm { address } => {
            let (resource_type, name) = address
                .split_once('.')
                .ok_or_else(|| format!("expected <type>.<name>, got '{}'", address))?;
            with_lock(
                backend.as_ref(),
                "state rm",
                remove_locked(backend.as_ref(), resource_type, name),
            )
            .await
        }
    }
}

async fn remove_locked(
    backend: &dyn StateBackend,
    resource_type: &str,
    name: &str,
) -> Result<(), String> {
    let mut state = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No state at {}.", backend.location()))?;

    if state.remove_resource(resource_type, name).is_none() {
        return Err(format!("{}.{} is not in the state", resource_type, name));
    }

    state.increment_serial();
    backend
        .write_state(&state)
        .await
        .map_err(|e| e.to_string())?;

    println!(
        "{}",
        format!("Removed {}.{} from the state.", resource_type, name).green()
    );
    Ok(())
}

async fn run_state_show(backend: &dyn StateBackend) -> Result<(), String> {
    let Some(state) = backend.read_state().await.map_err(|e| e.to_string())? else {
        println!("No state at {}.", backend.location());
        return Ok(());
    };

    println!(
        "{} serial {}, lineage {}",
        backend.location().bold(),
        state.serial,
        state.lineage
    );

    for resource in &state.resources {
        let current = find_resource_type(&resource.resource_type).map(|t| t.schema());
        let outdated = current
            .as_ref()
            .is_some_and(|schema| schema.version != resource.schema_version);

        let header = format!(
            "{}.{} (schema version {})",
            resource.resource_type, resource.name, resource.schema_version
        );
        match &current {
            Some(schema) if !outdated => {
                println!("\n{}", header.cyan());
                print_typed(&resource.typed_attributes(schema), schema);
            }
            // Older layouts can't be decoded with the current schema
            _ if outdated => {
                println!("\n{} {}", header.cyan(), "needs upgrade".yellow());
                print_flat(&resource.attributes, current.as_ref());
            }
            _ => {
                println!("\n{}", header.cyan());
                print_flat(&resource.attributes, None);
            }
        }
    }

    Ok(())
}

async fn run_state_upgrade(backend: &dyn StateBackend, dry_run: bool) -> Result<(), String> {
    with_lock(backend, "state upgrade", upgrade_locked(backend, dry_run)).await
}

async fn upgrade_locked(backend: &dyn StateBackend, dry_run: bool) -> Result<(), String> {
    let Some(mut state) = backend.read_state().await.map_err(|e| e.to_string())? else {
        println!("No state at {}.", backend.location());
        return Ok(());
    };

    let before = state_json(&state)?;
    let report = upgrade_state(&mut state, &resource_types()).map_err(|e| e.to_string())?;

    if report.is_empty() {
        println!(
            "{}",
            format!(
                "State is up to date ({} resources).",
                report.unchanged
            )
            .green()
        );
        return Ok(());
    }

    for upgraded in &report.upgraded {
        println!(
            "  {} {}.{}: schema version {} -> {}",
            "~".yellow(),
            upgraded.resource_type,
            upgraded.name,
            upgraded.from_version,
            upgraded.to_version
        );
    }

    if dry_run {
        print_diff(&before, &state_json(&state)?);
        println!(
            "{}",
            format!(
                "Dry run: {} resources would be upgraded.",
                report.upgraded.len()
            )
            .yellow()
        );
        return Ok(());
    }

    state.increment_serial();
    backend
        .write_state(&state)
        .await
        .map_err(|e| e.to_string())?;

    println!(
        "{}",
        format!(
            "Upgraded {} resources, {} unchanged.",
            report.upgraded.len(),
            report.unchanged
        )
        .green()
        .bold()
    );
    Ok(())
}

fn state_json(state: &StateFile) -> Result<String, String> {
    serde_json::to_string_pretty(state)
        .map(|mut json| {
            json.push('\n');
            json
        })
        .map_err(|e| format!("Failed to serialize state: {}", e))
}

fn print_diff(original: &str, upgraded: &str) {
    let diff = TextDiff::from_lines(original, upgraded);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
}

// =============================================================================
// Read / Query
// =============================================================================

async fn load_provider(flags: ProviderConfig, config: Option<&Path>) -> Result<SsmProvider, String> {
    let file_config = match config {
        Some(path) => ConfigFile::load(path)?.provider,
        None => ProviderConfig::default(),
    };

    SsmProvider::new(&flags.or(file_config))
        .await
        .map_err(|e| e.to_string())
}

async fn run_read(
    resource_type: &str,
    identifier: &str,
    flags: ProviderConfig,
    config: Option<&Path>,
) -> Result<(), String> {
    let schema = find_resource_type(resource_type)
        .map(|t| t.schema())
        .ok_or_else(|| format!("Unknown resource type: {}", resource_type))?;
    let provider = load_provider(flags, config).await?;

    let id = ResourceId::new(resource_type, "read");
    let state = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| e.to_string())?;

    if !state.exists {
        println!(
            "{}",
            format!("{} '{}' does not exist.", resource_type, identifier).yellow()
        );
        return Ok(());
    }

    println!("{}", format!("{} {}", resource_type, identifier).cyan().bold());
    print_flat(&flatmap::flatten(&state.attributes), Some(&schema));
    Ok(())
}

async fn run_import(
    resource_type: &str,
    name: &str,
    identifier: &str,
    flags: ProviderConfig,
    config: Option<&Path>,
    state_path: &Path,
) -> Result<(), String> {
    let schema_version = find_resource_type(resource_type)
        .map(|t| t.schema_version())
        .ok_or_else(|| format!("Unknown resource type: {}", resource_type))?;
    let provider = load_provider(flags, config).await?;

    let id = ResourceId::new(resource_type, name);
    let state = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| e.to_string())?;
    if !state.exists {
        return Err(format!("{} '{}' does not exist", resource_type, identifier));
    }

    let record = ResourceState::from_state(&state, provider.name(), schema_version);
    let backend = state_backend(state_path)?;
    with_lock(
        backend.as_ref(),
        "import",
        record_locked(backend.as_ref(), record),
    )
    .await?;

    println!(
        "{}",
        format!("Imported {} as {}.", identifier, id).green().bold()
    );
    Ok(())
}

/// Add or replace one resource in the state file
async fn record_locked(backend: &dyn StateBackend, record: ResourceState) -> Result<(), String> {
    let mut state = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_else(StateFile::new);

    state.upsert_resource(record);
    state.increment_serial();
    backend.write_state(&state).await.map_err(|e| e.to_string())
}

async fn run_query(
    data_source: &str,
    attributes: &[(String, String)],
    flags: ProviderConfig,
    config: Option<&Path>,
) -> Result<(), String> {
    let schema = find_data_source_type(data_source)
        .map(|t| t.schema())
        .ok_or_else(|| format!("Unknown data source type: {}", data_source))?;

    let query = attributes
        .iter()
        .try_fold(Resource::data(data_source, "query"), |query, (key, raw)| {
            let value = query_value(&schema, key, raw)?;
            Ok::<_, String>(query.with_attribute(key.clone(), value))
        })?;

    let provider = load_provider(flags, config).await?;
    let state = provider
        .read_data_source(&query)
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", format!("data {}", data_source).cyan().bold());
    print_flat(&flatmap::flatten(&state.attributes), Some(&schema));
    Ok(())
}

/// Interpret a command-line value using the attribute's type
///
/// Strings are taken verbatim; anything else is parsed as JSON.
fn query_value(schema: &ResourceSchema, key: &str, raw: &str) -> Result<Value, String> {
    let attribute = schema
        .attributes
        .get(key)
        .ok_or_else(|| format!("Unknown attribute '{}' for {}", key, schema.resource_type))?;

    match attribute.attr_type.base() {
        AttributeType::String | AttributeType::Enum(_) => Ok(Value::String(raw.to_string())),
        _ => serde_json::from_str::<serde_json::Value>(raw)
            .map(|json| Value::from_json(&json))
            .map_err(|e| format!("Invalid value for '{}': {}", key, e)),
    }
}

fn print_typed(attributes: &HashMap<String, Value>, schema: &ResourceSchema) {
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();
    let width = keys.iter().map(|k| k.len()).max().unwrap_or(0);

    for key in keys {
        let shown = match &attributes[key] {
            _ if schema.is_sensitive(key) => "(sensitive)".dimmed().to_string(),
            Value::String(s) => s.clone(),
            other => other.to_json().to_string(),
        };
        println!("  {:width$} = {}", key, shown, width = width);
    }
}

fn print_flat(attributes: &FlatState, schema: Option<&ResourceSchema>) {
    let width = attributes.keys().map(String::len).max().unwrap_or(0);
    let sensitive: HashMap<&str, bool> = attributes
        .keys()
        .map(|key| {
            let top = key.split('.').next().unwrap_or(key);
            (key.as_str(), schema.is_some_and(|s| s.is_sensitive(top)))
        })
        .collect();

    for (key, value) in attributes {
        let shown = if sensitive.get(key.as_str()).copied().unwrap_or(false) {
            "(sensitive)".dimmed().to_string()
        } else {
            value.clone()
        };
        println!("  {:width$} = {}", key, shown, width = width);
    }
}
