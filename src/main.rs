use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use odoc_mcp::config::{Config, DEFAULT_SAGE_URL, DEFAULT_SHERLODOC_URL};
use odoc_mcp::mcp::{self, OcamlDocs};
use odoc_mcp::server;

#[derive(Parser, Debug)]
#[command(version, about = "OCaml Documentation MCP Server")]
struct Cli {
    /// Type of server to run
    #[arg(short, long, value_enum, default_value_t = ServerType::Sse)]
    server_type: ServerType,

    /// Address for the SSE server
    #[arg(short, long, default_value = "127.0.0.1:8007")]
    address: String,

    /// Root of locally generated odoc HTML output
    #[arg(long, global = true)]
    local_docs: Option<PathBuf>,

    /// Base URL of the sage.ci.dev package tree
    #[arg(long, global = true, default_value = DEFAULT_SAGE_URL)]
    sage_url: String,

    /// Base URL of the Sherlodoc search service
    #[arg(long, global = true, default_value = DEFAULT_SHERLODOC_URL)]
    sherlodoc_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ServerType {
    /// Start an SSE server
    Sse,
    /// Start a stdio server
    Stdio,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single tool call, print its JSON result and exit
    Test {
        #[command(subcommand)]
        call: ToolCall,
    },
}

#[derive(Subcommand, Debug)]
enum ToolCall {
    /// Search names and type signatures with Sherlodoc
    Sherlodoc {
        #[arg(default_value = "int -> string")]
        query: String,
    },
    /// Find packages by name
    SearchPackages {
        #[arg(default_value = "http")]
        query: String,
    },
    /// Package overview
    PackageInfo {
        #[arg(default_value = "lwt")]
        package: String,
        #[arg(value_name = "VERSION")]
        package_version: Option<String>,
    },
    /// Documentation of one module of a published package
    ModuleDoc {
        #[arg(default_value = "lwt")]
        package: String,
        #[arg(default_value = "Lwt")]
        module_path: String,
        #[arg(value_name = "VERSION")]
        package_version: Option<String>,
    },
    /// Modules in the local docs directory
    ListLocal { path: Option<String> },
    /// Documentation of one module from the local docs directory
    LocalModuleDoc {
        #[arg(default_value = "Stdlib")]
        module_path: String,
        path: Option<String>,
    },
}

async fn run_tool(docs: &OcamlDocs, call: ToolCall) -> serde_json::Value {
    match call {
        ToolCall::Sherlodoc { query } => mcp::render(&docs.sherlodoc(query).await),
        ToolCall::SearchPackages { query } => mcp::render(&docs.search_package_names(query).await),
        ToolCall::PackageInfo {
            package,
            package_version,
        } => mcp::render(&docs.get_package_info(package, package_version).await),
        ToolCall::ModuleDoc {
            package,
            module_path,
            package_version,
        } => mcp::render(&docs.get_module_doc(package, module_path, package_version).await),
        ToolCall::ListLocal { path } => mcp::render(&Ok(docs.list_local_modules(path).await)),
        ToolCall::LocalModuleDoc { module_path, path } => {
            mcp::render(&docs.get_local_module_doc(module_path, path).await)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(&cli.sage_url, &cli.sherlodoc_url, cli.local_docs);

    match cli.command {
        Some(Command::Test { call }) => {
            server::init_stderr_tracing(tracing::Level::WARN);
            let docs = OcamlDocs::new(config)?;
            let result = run_tool(&docs, call).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        None => match cli.server_type {
            ServerType::Sse => {
                println!("Starting SSE server on {}", cli.address);
                server::start_sse_server(&cli.address, config).await?;
            }
            ServerType::Stdio => {
                server::start_stdio_server(config).await?;
            }
        },
    }

    Ok(())
}
