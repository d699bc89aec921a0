//! entwine: builds an OpenAPI 3 document from a tree of YAML fragments.
//!
//! Emits the component schemas, the full document and a Markdown name
//! reference, inlines single fragments for inspection, and serves the
//! live document over HTTP.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use entwine_compiler::{
    assemble, compose, dereference_file, render_reference, to_json, to_yaml, write_output,
    CompileError, ProjectLayout, ProjectManifest,
};
use entwine_telemetry::{LogFormat, TelemetryConfig};

mod api;
mod error;
mod server;

/// Exit code for fragment, manifest or rendering errors.
const EXIT_CONTENT: u8 = 1;
/// Exit code for filesystem errors (missing directories, unreadable files).
const EXIT_IO: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "entwine", about = "Assemble OpenAPI documents from YAML fragments", version)]
struct Cli {
    /// Project root containing the entity and path fragment directories.
    #[arg(long, global = true, default_value = ".", env = "ENTWINE_ROOT")]
    root: PathBuf,

    /// Project manifest (defaults to entwine.yaml in the project root, if present).
    #[arg(long, global = true, env = "ENTWINE_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "ENTWINE_LOG_LEVEL")]
    log_level: String,

    /// Log format (text, pretty, json).
    #[arg(long, global = true, default_value = "text", env = "ENTWINE_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the assembled component schemas as YAML.
    Schemas {
        /// Output file (defaults to output.schemas in the manifest).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print to stdout instead of writing a file.
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Write the full OpenAPI document.
    Spec {
        /// Output file (defaults to output.spec in the manifest).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document format.
        #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
        format: DocumentFormat,

        /// Print to stdout instead of writing a file.
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Write a Markdown reference of every schema name.
    Docs {
        /// Output file (defaults to output.reference in the manifest).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print to stdout instead of writing a file.
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Print a fragment as JSON with every $ref inlined and allOf merged.
    Show {
        /// Fragment file to inspect.
        file: PathBuf,
    },

    /// Serve the live document and API explorers over HTTP.
    Serve {
        /// Listen address (defaults to server.listen in the manifest).
        #[arg(long, env = "ENTWINE_LISTEN")]
        listen: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DocumentFormat {
    Yaml,
    Json,
}

/// Resolved project settings shared by every command.
struct Project {
    root: PathBuf,
    manifest: ProjectManifest,
    layout: ProjectLayout,
}

impl Project {
    fn open(root: &Path, manifest: Option<&Path>) -> Result<Self, CompileError> {
        let manifest = ProjectManifest::discover(root, manifest)?;
        Ok(Self {
            root: root.to_path_buf(),
            layout: manifest.layout(root),
            manifest,
        })
    }

    fn output_path(&self, explicit: Option<PathBuf>, default: &str) -> PathBuf {
        explicit.unwrap_or_else(|| self.manifest.output_path(&self.root, default))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(cli.log_format);
    if let Err(e) = entwine_telemetry::init(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(EXIT_CONTENT);
    }

    let project = match Project::open(&cli.root, cli.manifest.as_deref()) {
        Ok(project) => project,
        Err(e) => return fail(&e),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create runtime: {}", e);
            return ExitCode::from(EXIT_IO);
        }
    };

    runtime.block_on(run(cli.command, project))
}

async fn run(command: Commands, project: Project) -> ExitCode {
    entwine_telemetry::log_startup!(root = %project.root.display(), "entwine starting");

    let result = match command {
        Commands::Schemas { output, stdout } => run_schemas(&project, output, stdout).await,
        Commands::Spec {
            output,
            format,
            stdout,
        } => run_spec(&project, output, format, stdout).await,
        Commands::Docs { output, stdout } => run_docs(&project, output, stdout).await,
        Commands::Show { file } => run_show(&file),
        Commands::Serve { listen } => return run_serve(project, listen).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn fail(err: &CompileError) -> ExitCode {
    eprintln!("error: {}", err);
    if err.is_io() {
        ExitCode::from(EXIT_IO)
    } else {
        ExitCode::from(EXIT_CONTENT)
    }
}

async fn run_schemas(
    project: &Project,
    output: Option<PathBuf>,
    stdout: bool,
) -> Result<(), CompileError> {
    let set = assemble(&project.layout).await?;
    let rendered = to_yaml(set.schemas())?;

    if stdout {
        print!("{}", rendered);
        return Ok(());
    }

    let path = project.output_path(output, &project.manifest.output.schemas);
    write_output(&path, &rendered).await?;
    eprintln!("wrote {} schema(s) to {}", set.len(), path.display());
    Ok(())
}

async fn run_spec(
    project: &Project,
    output: Option<PathBuf>,
    format: DocumentFormat,
    stdout: bool,
) -> Result<(), CompileError> {
    let document = compose(&project.layout).await?;
    let rendered = match format {
        DocumentFormat::Yaml => to_yaml(&document)?,
        DocumentFormat::Json => to_json(&document)?,
    };

    if stdout {
        print!("{}", rendered);
        return Ok(());
    }

    let path = match (output, format) {
        (Some(path), _) => path,
        (None, DocumentFormat::Yaml) => project.output_path(None, &project.manifest.output.spec),
        (None, DocumentFormat::Json) => project
            .output_path(None, &project.manifest.output.spec)
            .with_extension("json"),
    };
    write_output(&path, &rendered).await?;

    let paths = document
        .get("paths")
        .and_then(|p| p.as_object())
        .map_or(0, |p| p.len());
    eprintln!("wrote OpenAPI document to {} ({} paths)", path.display(), paths);
    Ok(())
}

async fn run_docs(
    project: &Project,
    output: Option<PathBuf>,
    stdout: bool,
) -> Result<(), CompileError> {
    let set = assemble(&project.layout).await?;
    let rendered = render_reference(&set);

    if stdout {
        print!("{}", rendered);
        return Ok(());
    }

    let path = project.output_path(output, &project.manifest.output.reference);
    write_output(&path, &rendered).await?;
    eprintln!("wrote API reference to {}", path.display());
    Ok(())
}

fn run_show(file: &Path) -> Result<(), CompileError> {
    let resolved = dereference_file(file)?;
    print!("{}", to_json(&resolved)?);
    Ok(())
}

async fn run_serve(project: Project, listen: Option<String>) -> ExitCode {
    let listen = listen.unwrap_or_else(|| project.manifest.server.listen.clone());
    let listen_addr: SocketAddr = match listen.parse() {
        Ok(addr) => addr,
        Err(_) => {
            eprintln!("error: invalid listen address: {}", listen);
            return ExitCode::from(EXIT_CONTENT);
        }
    };

    let config = server::ServerConfig {
        listen_addr,
        layout: project.layout,
    };

    match server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_IO)
        }
    }
}
