//! # CLI Module
//!
//! Terminal front-end over [`crate::session::Session`].
//!
//! ## Commands
//!
//! ### `tags`
//!
//! List tags (with descriptions) and their endpoints:
//!
//! ```bash
//! apiform --base-url http://localhost:8000 tags
//! ```
//!
//! ### `form`
//!
//! Apply edits and print the form view plus the request it would produce:
//!
//! ```bash
//! apiform --spec openapi.yaml form createPet --set name=rex --include tag --set tag=dog
//! ```
//!
//! ### `call`
//!
//! Apply edits, send the request, render the response:
//!
//! ```bash
//! apiform -b http://localhost:8000 call "GET /pets/{petId}" --param petId=7
//! apiform -b http://localhost:8000 call login --field username=ana --field password=secret
//! apiform -b http://localhost:8000 call createPet --raw-body '{"name": "rex"}' --dry-run
//! ```
//!
//! ### `shell`
//!
//! Interactive session; `help` lists the commands.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use apiform::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli)?;
//! ```

mod commands;
pub mod render;
mod repl;


pub use commands::{apply_edit_args, run_cli, split_assignment, Cli, Commands, EditArgs, GlobalArgs};
pub use repl::{Flow, Repl};
