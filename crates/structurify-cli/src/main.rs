use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use structurify_client::{ClientConfig, StructurifyClient, WaitOptions};
use structurify_core::models::{CreateExportParams, CreateProjectParams, ExportDownload, ExportFormat};
use structurify_core::webhook::{compute_signature, verify_signature};

#[derive(Parser)]
#[command(name = "structurify", version, about = "Structurify document extraction API client")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// API key (reads from STRUCTURIFY_API_KEY env var if not provided)
    #[arg(long, env = "STRUCTURIFY_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, env = "STRUCTURIFY_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Per-attempt request timeout in milliseconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Retries for timeouts, connection failures and rate limits
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// List project templates
    Templates {
        /// List reusable column templates instead
        #[arg(long, default_value_t = false)]
        columns: bool,
    },

    /// Show a project template with its columns
    Template { id: String },

    /// List projects
    Projects,

    /// Show a project with its columns and documents
    Project { id: String },

    /// Create a project from a template
    CreateProject {
        #[arg(long)]
        name: String,

        #[arg(long)]
        template_id: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project
    DeleteProject { id: String },

    /// Upload documents to a project
    Upload {
        #[arg(long)]
        project_id: String,

        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Start an extraction job and wait for it to finish
    Extract {
        #[arg(long)]
        project_id: String,

        /// Print the job as soon as it is created
        #[arg(long, default_value_t = false)]
        no_wait: bool,

        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,

        /// Delay between status checks in milliseconds
        #[arg(long, default_value_t = 2000)]
        poll_ms: u64,
    },

    /// Export extracted data
    Export {
        #[arg(long)]
        project_id: String,

        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the webhook signature of a payload file
    Sign {
        #[arg(long, env = "STRUCTURIFY_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,

        payload: PathBuf,
    },

    /// Verify a webhook signature against a payload file
    Verify {
        #[arg(long, env = "STRUCTURIFY_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,

        /// Value of the X-Structurify-Signature header
        #[arg(long)]
        signature: String,

        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("structurify=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let connection = cli.connection;
    let client = || build_client(&connection);

    match cli.command {
        Commands::Templates { columns } => {
            let client = client()?;
            if columns {
                print_json(&client.templates().list_columns().await?)?;
            } else {
                print_json(&client.templates().list().await?)?;
            }
        }
        Commands::Template { id } => {
            let template = client()?
                .templates()
                .get(&id)
                .await
                .with_context(|| format!("Failed to fetch template {id}"))?;
            print_json(&template)?;
        }
        Commands::Projects => print_json(&client()?.projects().list().await?)?,
        Commands::Project { id } => {
            let details = client()?
                .projects()
                .get(&id)
                .await
                .with_context(|| format!("Failed to fetch project {id}"))?;
            print_json(&details)?;
        }
        Commands::CreateProject {
            name,
            template_id,
            description,
        } => {
            let mut params = CreateProjectParams::new(name, template_id);
            if let Some(description) = description {
                params = params.with_description(description);
            }
            print_json(&client()?.projects().create(&params).await?)?;
        }
        Commands::DeleteProject { id } => {
            print_json(&client()?.projects().delete(&id).await?)?;
        }
        Commands::Upload { project_id, paths } => {
            cmd_upload(&client()?, &project_id, &paths).await?;
        }
        Commands::Extract {
            project_id,
            no_wait,
            timeout_secs,
            poll_ms,
        } => {
            let options =
                WaitOptions::new(Duration::from_secs(timeout_secs), Duration::from_millis(poll_ms));
            cmd_extract(&client()?, &project_id, no_wait, options).await?;
        }
        Commands::Export {
            project_id,
            format,
            output,
        } => {
            cmd_export(&client()?, &project_id, format, output.as_deref()).await?;
        }
        Commands::Sign { secret, payload } => {
            let body = read_payload(&payload)?;
            println!("{}", compute_signature(&body, &secret));
        }
        Commands::Verify {
            secret,
            signature,
            payload,
        } => {
            let body = read_payload(&payload)?;
            if verify_signature(&body, &signature, &secret) {
                println!("valid");
            } else {
                println!("invalid");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Build the API client from global flags. Webhook commands never call this,
/// so they work without an API key.
fn build_client(args: &ConnectionArgs) -> Result<StructurifyClient> {
    let api_key = args
        .api_key
        .clone()
        .context("API key not set. Pass --api-key or set STRUCTURIFY_API_KEY.")?;

    let mut config = ClientConfig::new(api_key)?;
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.as_str());
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(max_retries) = args.max_retries {
        config = config.with_max_retries(max_retries);
    }

    StructurifyClient::new(config).context("Failed to create API client")
}

async fn cmd_upload(client: &StructurifyClient, project_id: &str, paths: &[PathBuf]) -> Result<()> {
    let mut documents = Vec::with_capacity(paths.len());

    for path in paths {
        let document = client
            .documents()
            .upload_from_path(project_id, path, None)
            .await
            .with_context(|| format!("Failed to upload {}", path.display()))?;
        tracing::info!(id = %document.id, name = %document.name, "Uploaded document");
        documents.push(document);
    }

    print_json(&documents)
}

async fn cmd_extract(
    client: &StructurifyClient,
    project_id: &str,
    no_wait: bool,
    options: WaitOptions,
) -> Result<()> {
    let job = client
        .extraction()
        .run(project_id)
        .await
        .context("Failed to start extraction job")?;

    tracing::info!(job_id = %job.id, status = %job.status, "Extraction job started");

    if no_wait {
        return print_json(&job);
    }

    let job = client
        .extraction()
        .wait_for_completion(&job.id, options)
        .await?;

    print_json(&job)
}

async fn cmd_export(
    client: &StructurifyClient,
    project_id: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let params = CreateExportParams::new(project_id, format);
    let download = client
        .exports()
        .create_and_fetch(&params)
        .await
        .context("Failed to export project data")?;

    let content = match download {
        ExportDownload::Inline(data) => data,
        ExportDownload::Object(value) => serde_json::to_string_pretty(&value)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = content.len(), "Export written");
        }
        None => println!("{content}"),
    }

    Ok(())
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read payload file: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
