//! OCaml documentation MCP tools.
//!
//! [`OcamlDocs`] exposes six tools: signature search through Sherlodoc,
//! package search, package overviews and module pages from sage.ci.dev, and
//! module listings and pages from a local odoc output directory.
//!
//! Remote failures become tool errors. Anything that simply does not exist
//! (unknown package, version or module, missing local directory) is a normal
//! result carrying a `not_found` explanation.
//!
//! # Example
//! ```no_run
//! use odoc_mcp::config::Config;
//! use odoc_mcp::mcp::OcamlDocs;
//!
//! async fn example() {
//!     let docs = OcamlDocs::new(Config::default()).unwrap();
//!     let info = docs.get_package_info("lwt".to_string(), None).await;
//! }
//! ```

use std::path::PathBuf;

use itertools::Itertools;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities};
use rmcp::{ServerHandler, model::ServerInfo, tool};
use rmcp::{schemars, model::{IntoContents, Content}};
use serde::Serialize;

use crate::client::DocsClient;
use crate::config::Config;
use crate::docs_parser::{self, Library, ModuleDoc, OdocPage, SignatureHit};
use crate::error::DocsError;
use crate::local::{LocalDocs, LocalModule};
use crate::version;

/// Maximum number of package names returned by a search.
pub const PACKAGE_MATCH_LIMIT: usize = 50;

/// Maximum number of top-level modules suggested when a module is missing.
pub const MODULE_HINT_LIMIT: usize = 30;

const LOCAL_DOCS_UNSET: &str =
    "Local docs not configured. Start the server with --local-docs <path> or pass a path.";

/// Explanation returned instead of a result when the target does not exist.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotFound {
    pub not_found: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Lookup<T> {
    Found(T),
    NotFound(NotFound),
}

impl<T> Lookup<T> {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(NotFound {
            not_found: reason.into(),
            available: Vec::new(),
        })
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignatureSearch {
    pub query: String,
    pub results: Vec<SignatureHit>,
    pub total_results: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageMatches {
    pub query: String,
    pub matches: Vec<String>,
    pub total_matches: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageInfo {
    pub package: String,
    pub version: String,
    pub failed: bool,
    pub description: String,
    pub libraries: Vec<Library>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageModuleDoc {
    pub package: String,
    pub version: String,
    pub module: String,
    #[serde(flatten)]
    pub doc: ModuleDoc,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LocalModules {
    pub root: Option<PathBuf>,
    pub modules: Vec<LocalModule>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LocalModules {
    fn empty(root: Option<PathBuf>, note: impl Into<String>) -> Self {
        Self {
            root,
            modules: Vec::new(),
            total: 0,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LocalModuleDoc {
    pub library: String,
    pub module: String,
    #[serde(flatten)]
    pub doc: ModuleDoc,
}

fn json_content<T: Serialize>(value: &T) -> Content {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Content::text(text),
        Err(e) => Content::text(format!("Failed to encode result: {e}")),
    }
}

impl<T: Serialize> IntoContents for Lookup<T> {
    fn into_contents(self) -> Vec<Content> {
        vec![json_content(&self)]
    }
}

macro_rules! json_contents {
    ($($ty:ty),* $(,)?) => {
        $(impl IntoContents for $ty {
            fn into_contents(self) -> Vec<Content> {
                vec![json_content(&self)]
            }
        })*
    };
}

json_contents!(SignatureSearch, PackageMatches, LocalModules);

/// JSON form of a tool result, errors included, for the one-shot CLI mode.
pub fn render<T: Serialize>(result: &Result<T, DocsError>) -> serde_json::Value {
    match result {
        Ok(value) => serde_json::to_value(value)
            .unwrap_or_else(|e| serde_json::json!({ "error": format!("Failed to encode result: {e}") })),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

/// Find the generated page for a dotted module path in a build's file list.
///
/// `Base.List` matches `.../Base/List/index.html`, exactly first and then
/// ignoring case.
pub fn find_module_file<'a>(files: &'a [String], module_path: &str) -> Option<&'a str> {
    let suffix = format!("/{}/index.html", module_path.split('.').join("/"));
    let lower = suffix.to_lowercase();
    files
        .iter()
        .find(|f| f.ends_with(&suffix))
        .or_else(|| files.iter().find(|f| f.to_lowercase().ends_with(&lower)))
        .map(String::as_str)
}

/// Top-level module names present in a build, for "did you mean" hints.
///
/// Paths look like `doc/<library>/<Module>/.../index.html`.
fn top_level_modules(files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter_map(|f| f.strip_prefix("doc/")?.strip_suffix("/index.html"))
        .filter_map(|rest| rest.split('/').nth(1))
        .map(str::to_string)
        .sorted()
        .dedup()
        .take(MODULE_HINT_LIMIT)
        .collect()
}

/// MCP service answering OCaml documentation queries.
#[derive(Clone)]
pub struct OcamlDocs {
    client: DocsClient,
    local_docs: Option<PathBuf>,
}

#[tool(tool_box)]
impl OcamlDocs {
    pub fn new(config: Config) -> Result<Self, DocsError> {
        Ok(Self {
            client: DocsClient::new(&config)?,
            local_docs: config.local_docs,
        })
    }

    /// Resolve a requested version against what sage has published.
    async fn resolve(&self, package: &str, requested: Option<&str>) -> Result<Lookup<String>, DocsError> {
        let Some(versions) = self.client.list_versions(package).await? else {
            return Ok(Lookup::not_found(format!("Package '{package}' not found on sage.ci.dev")));
        };
        match version::match_version(requested, &versions) {
            Some(resolved) => {
                tracing::debug!("Resolved {} {:?} to {}", package, requested, resolved);
                Ok(Lookup::Found(resolved))
            }
            None => Ok(Lookup::NotFound(NotFound {
                not_found: format!(
                    "No version of '{}' matches '{}'",
                    package,
                    requested.unwrap_or(version::LATEST)
                ),
                available: versions,
            })),
        }
    }

    fn local_root(&self, path: Option<String>) -> Option<PathBuf> {
        path.filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| self.local_docs.clone())
    }

    #[tool(description = "Search OCaml names and type signatures across all packages using Sherlodoc. \
        Good for finding functions by type signature or name.")]
    pub async fn sherlodoc(
        &self,
        #[tool(param)]
        #[schemars(description = "A type signature like \"int -> string\", a name like \"List.map\", \
            or a type like \"'a list -> ('a -> 'b) -> 'b list\"")]
        query: String,
    ) -> Result<SignatureSearch, DocsError> {
        tracing::info!("Sherlodoc query {:?}", query);
        let results = self.client.sherlodoc(&query).await?;
        Ok(SignatureSearch {
            total_results: results.len(),
            query,
            results,
        })
    }

    #[tool(description = "Find OCaml packages by name. Case-insensitive substring search over \
        every package on sage.ci.dev, returning up to 50 names.")]
    pub async fn search_package_names(
        &self,
        #[tool(param)]
        #[schemars(description = "Substring to search for in package names, e.g. \"lwt\", \"http\", \"json\"")]
        query: String,
    ) -> Result<PackageMatches, DocsError> {
        let needle = query.to_lowercase();
        let matches: Vec<String> = self
            .client
            .list_packages()
            .await?
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect();
        tracing::info!("{} packages match {:?}", matches.len(), query);
        Ok(PackageMatches {
            total_matches: matches.len(),
            matches: matches.into_iter().take(PACKAGE_MATCH_LIMIT).collect(),
            query,
        })
    }

    #[tool(description = "Get an overview of an OCaml package: description, libraries, and modules.")]
    pub async fn get_package_info(
        &self,
        #[tool(param)]
        #[schemars(description = "Package name, e.g. \"lwt\", \"base\", \"cohttp\"")]
        package_name: String,
        #[tool(param)]
        #[schemars(description = "Version or version prefix, e.g. \"5.9\". Defaults to the latest version.")]
        version: Option<String>,
    ) -> Result<Lookup<PackageInfo>, DocsError> {
        let version = match self.resolve(&package_name, version.as_deref()).await? {
            Lookup::Found(version) => version,
            Lookup::NotFound(missing) => return Ok(Lookup::NotFound(missing)),
        };

        let Some(status) = self.client.build_status(&package_name, &version).await? else {
            return Ok(Lookup::not_found(format!(
                "Could not fetch status for {package_name}/{version}"
            )));
        };

        let page = self
            .client
            .odoc_page(&package_name, &version, "doc/index.html")
            .await?
            .map(|json| {
                serde_json::from_str::<OdocPage>(&json).unwrap_or_else(|e| {
                    tracing::warn!("Unparsable index page for {}/{}: {}", package_name, version, e);
                    OdocPage::default()
                })
            })
            .unwrap_or_default();

        let mut description = docs_parser::extract_preamble_text(&page.preamble);
        if description.is_empty() {
            description = docs_parser::extract_preamble_text(&page.content);
        }
        let libraries = docs_parser::extract_package_libraries(&page.content);

        Ok(Lookup::Found(PackageInfo {
            package: package_name,
            version,
            failed: status.failed,
            description,
            libraries,
        }))
    }

    #[tool(description = "Get documentation for a specific OCaml module: its preamble and its \
        types, values, exceptions and submodules with their signatures.")]
    pub async fn get_module_doc(
        &self,
        #[tool(param)]
        #[schemars(description = "Package name, e.g. \"lwt\", \"base\"")]
        package_name: String,
        #[tool(param)]
        #[schemars(description = "Dot-separated module path, e.g. \"Lwt\", \"Base.List\", \"Lwt_unix.LargeFile\"")]
        module_path: String,
        #[tool(param)]
        #[schemars(description = "Version or version prefix. Defaults to the latest version.")]
        version: Option<String>,
    ) -> Result<Lookup<PackageModuleDoc>, DocsError> {
        let version = match self.resolve(&package_name, version.as_deref()).await? {
            Lookup::Found(version) => version,
            Lookup::NotFound(missing) => return Ok(Lookup::NotFound(missing)),
        };

        let Some(status) = self.client.build_status(&package_name, &version).await? else {
            return Ok(Lookup::not_found(format!(
                "Could not fetch status for {package_name}/{version}"
            )));
        };

        let Some(file) = find_module_file(&status.files, &module_path) else {
            return Ok(Lookup::NotFound(NotFound {
                not_found: format!("Module '{module_path}' not found in {package_name}/{version}"),
                available: top_level_modules(&status.files),
            }));
        };

        let Some(page) = self.client.odoc_page(&package_name, &version, file).await? else {
            return Ok(Lookup::not_found(format!(
                "Could not fetch documentation for {module_path}"
            )));
        };

        Ok(Lookup::Found(PackageModuleDoc {
            package: package_name,
            version,
            module: module_path,
            doc: ModuleDoc::from_page_json(&page),
        }))
    }

    #[tool(description = "List all modules available in a local odoc documentation directory, \
        grouped by library.")]
    pub async fn list_local_modules(
        &self,
        #[tool(param)]
        #[schemars(description = "Local odoc HTML output directory. Defaults to the --local-docs root.")]
        path: Option<String>,
    ) -> LocalModules {
        let Some(root) = self.local_root(path) else {
            return LocalModules::empty(None, LOCAL_DOCS_UNSET);
        };
        let docs = LocalDocs::new(&root);
        if !docs.exists() {
            return LocalModules::empty(
                Some(root.clone()),
                format!("Local docs path does not exist: {}", root.display()),
            );
        }
        match docs.list_modules() {
            Ok(modules) => LocalModules {
                root: Some(root),
                total: modules.len(),
                modules,
                note: None,
            },
            Err(e) => {
                tracing::warn!("Failed to scan {:?}: {}", root, e);
                LocalModules::empty(Some(root), e.to_string())
            }
        }
    }

    #[tool(description = "Get documentation for a module from local odoc output: library name, \
        preamble, and signatures.")]
    pub async fn get_local_module_doc(
        &self,
        #[tool(param)]
        #[schemars(description = "Dot-separated module path, e.g. \"Irmin\", \"Irmin.Store\"")]
        module_path: String,
        #[tool(param)]
        #[schemars(description = "Local odoc HTML output directory. Defaults to the --local-docs root.")]
        path: Option<String>,
    ) -> Result<Lookup<LocalModuleDoc>, DocsError> {
        let Some(root) = self.local_root(path) else {
            return Ok(Lookup::not_found(LOCAL_DOCS_UNSET));
        };
        let docs = LocalDocs::new(&root);
        if !docs.exists() {
            return Ok(Lookup::not_found(format!(
                "Local docs path does not exist: {}",
                root.display()
            )));
        }
        match docs.module_doc(&module_path) {
            Ok(Some((library, doc))) => Ok(Lookup::Found(LocalModuleDoc {
                library,
                module: module_path,
                doc,
            })),
            Ok(None) => Ok(Lookup::not_found(format!(
                "Module '{module_path}' not found in local docs"
            ))),
            Err(e @ DocsError::InvalidModulePath(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Failed to read {} under {:?}: {}", module_path, root, e);
                Ok(Lookup::not_found(e.to_string()))
            }
        }
    }
}

#[tool(tool_box)]
impl ServerHandler for OcamlDocs {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides OCaml package documentation from sage.ci.dev and Sherlodoc. \
                Use 'sherlodoc' to search by name or type signature, 'search_package_names' to find packages, \
                'get_package_info' for a package overview and 'get_module_doc' for one module's signatures. \
                'list_local_modules' and 'get_local_module_doc' read locally generated odoc output.".to_string()
            ),
        }
    }
}
