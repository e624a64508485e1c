use super::render;
use super::repl::Repl;
use crate::diagnostics::{print_notices, Notice};
use crate::form::{BodyMode, FieldPath, FormEdit};
use crate::runtime_config::{ClientConfig, ConfigOverrides};
use crate::session::Session;
use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;

/// Command-line interface for apiform
///
/// Loads an OpenAPI document, renders request forms from its schemas and
/// sends the resulting requests.
#[derive(Parser, Debug)]
#[command(name = "apiform", version)]
#[command(about = "Interactive OpenAPI client", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by all subcommands; they override config file and environment
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// TOML config file (ignored if missing)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL; the document is fetched from <base-url>/<json-location>
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Location of the API document relative to the base URL
    #[arg(long, global = true)]
    pub json_location: Option<String>,

    /// Local API document (.json, .yaml, .yml) used instead of fetching one
    #[arg(short, long, global = true)]
    pub spec: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum nesting depth rendered in forms
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            json_location: self.json_location.clone(),
            spec_file: self.spec.clone(),
            request_timeout_secs: self.timeout,
            max_form_depth: self.max_depth,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tags (with descriptions) and their endpoints
    Tags,
    /// Apply edits and print the form and the request it produces
    Form {
        /// Endpoint id, operationId or "METHOD /path"
        endpoint: String,

        #[command(flatten)]
        edits: EditArgs,
    },
    /// Apply edits, send the request and print the response
    Call {
        /// Endpoint id, operationId or "METHOD /path"
        endpoint: String,

        #[command(flatten)]
        edits: EditArgs,

        /// Print the prepared request instead of sending it
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the response body as raw JSON instead of a table
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Interactive session (type `help` for commands)
    Shell,
}

/// Form and request edits, applied in a fixed order: credentials, parameters,
/// form fields, body mode, raw body, override, includes, appends, removals,
/// values, excludes
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EditArgs {
    /// Parameter value; prefix the name with its location (query:id=5) when
    /// the same name is declared in several locations
    #[arg(long = "param", value_name = "[IN:]NAME=VALUE")]
    pub params: Vec<String>,

    /// Body field value, e.g. --set owner.name=ana or --set tags[0].id=3
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub sets: Vec<String>,

    /// Include an optional body field
    #[arg(long = "include", value_name = "PATH")]
    pub includes: Vec<String>,

    /// Exclude an optional body field
    #[arg(long = "exclude", value_name = "PATH")]
    pub excludes: Vec<String>,

    /// Append an element to an array of objects
    #[arg(long = "add", value_name = "PATH")]
    pub adds: Vec<String>,

    /// Remove element INDEX of an array of objects
    #[arg(long = "remove", value_name = "PATH=INDEX")]
    pub removes: Vec<String>,

    /// JSON deep-merged over the built body
    #[arg(long = "override", value_name = "JSON")]
    pub override_json: Option<String>,

    /// Raw JSON body (switches the endpoint to raw mode)
    #[arg(long = "raw-body", value_name = "JSON")]
    pub raw_body: Option<String>,

    /// Body mode: fields or raw
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Form-urlencoded field value
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Credential for a security scheme
    #[arg(long = "auth", value_name = "SCHEME=VALUE")]
    pub auth: Vec<String>,
}

/// Split `name=value` at the first `=`
pub fn split_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{raw}'"))
}

fn field_path(raw: &str) -> anyhow::Result<FieldPath> {
    FieldPath::parse(raw).map_err(|e| anyhow!(e))
}

/// Apply `edits` to the endpoint named by `selector`
pub fn apply_edit_args(
    session: &mut Session,
    selector: &str,
    edits: &EditArgs,
) -> anyhow::Result<Vec<Notice>> {
    let selector = Some(selector);
    let mut notices = Vec::new();

    for raw in &edits.auth {
        let (scheme, value) = split_assignment(raw)?;
        session.set_credential(scheme, value)?;
    }
    for raw in &edits.params {
        let (name, value) = split_assignment(raw)?;
        session.set_param(selector, name, value)?;
    }
    for raw in &edits.fields {
        let (name, value) = split_assignment(raw)?;
        session.set_form_field(selector, name, value)?;
    }
    if let Some(mode) = &edits.mode {
        let mode = BodyMode::parse(mode).ok_or_else(|| anyhow!("unknown body mode '{mode}' (fields or raw)"))?;
        session.set_body_mode(selector, mode)?;
    }
    if let Some(raw) = &edits.raw_body {
        session.set_raw_body(selector, raw)?;
    }
    if let Some(overlay) = &edits.override_json {
        notices.extend(session.set_override(selector, overlay)?);
    }

    let mut form_edits = Vec::new();
    for raw in &edits.includes {
        form_edits.push(FormEdit::SetIncluded {
            path: field_path(raw)?,
            included: true,
        });
    }
    for raw in &edits.adds {
        form_edits.push(FormEdit::AppendItem {
            path: field_path(raw)?,
        });
    }
    for raw in &edits.removes {
        let (path, index) = split_assignment(raw)?;
        let index = index
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid index in --remove '{raw}'"))?;
        form_edits.push(FormEdit::RemoveItem {
            path: field_path(path)?,
            index,
        });
    }
    for raw in &edits.sets {
        let (path, value) = split_assignment(raw)?;
        form_edits.push(FormEdit::SetValue {
            path: field_path(path)?,
            input: value.to_string(),
        });
    }
    for raw in &edits.excludes {
        form_edits.push(FormEdit::SetIncluded {
            path: field_path(raw)?,
            included: false,
        });
    }
    for edit in &form_edits {
        session.edit(selector, edit)?;
    }
    Ok(notices)
}

fn load_session(global: &GlobalArgs) -> anyhow::Result<Session> {
    let mut config = ClientConfig::load(global.config.as_deref())?;
    config.apply_overrides(&global.overrides());
    let mut session = Session::new(config)?;
    if session.config().spec_file.is_none() && session.config().base_url.is_none() {
        bail!("no API given: pass --base-url or --spec (or set APIFORM_BASE_URL)");
    }
    let notices = session.load(None)?;
    print_notices(&notices);
    Ok(session)
}

/// Execute a parsed command line
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Tags => {
            let session = load_session(&cli.global)?;
            print!("{}", render::tags(&session));
            Ok(())
        }
        Commands::Form { endpoint, edits } => {
            let mut session = load_session(&cli.global)?;
            let notices = apply_edit_args(&mut session, endpoint, edits)?;
            print_notices(&notices);
            let screen = session.form(Some(endpoint))?;
            print!("{}", render::form_screen(&screen));
            let preparation = session.preview(Some(endpoint))?;
            println!();
            print!("{}", render::preparation(&preparation));
            Ok(())
        }
        Commands::Call {
            endpoint,
            edits,
            dry_run,
            raw,
        } => {
            let mut session = load_session(&cli.global)?;
            let notices = apply_edit_args(&mut session, endpoint, edits)?;
            print_notices(&notices);
            if *dry_run {
                let preparation = session.preview(Some(endpoint))?;
                print!("{}", render::preparation(&preparation));
                return Ok(());
            }
            let outcome = session.send(Some(endpoint))?;
            print_notices(&outcome.notices);
            match render::raw_json(&outcome.record).filter(|_| *raw) {
                Some(json) => println!("{json}"),
                None => print!("{}", render::record(&outcome.record)),
            }
            if let Some(status) = session.auth_status() {
                eprintln!("auth: {status}");
            }
            Ok(())
        }
        Commands::Shell => {
            let mut config = ClientConfig::load(cli.global.config.as_deref())?;
            config.apply_overrides(&cli.global.overrides());
            let session = Session::new(config)?;
            let stdin = io::stdin();
            let mut repl = Repl::new(session, stdin.lock(), io::stdout());
            repl.run()
        }
    }
}
