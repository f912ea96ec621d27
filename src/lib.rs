// Library root
// -----------
// This crate exposes the price list pipeline as a library. The binary
// (`main.rs`) parses the command line and hands off to `ui`.
//
// Module responsibilities:
// - `api`: the blocking HTTP client for the pharmacy price list endpoint.
// - `credentials` / `config`: the cookie file and the contact/API settings
//   file, loaded and saved explicitly at the edges.
// - `model` / `transform`: the upstream schema and its normalisation into
//   spreadsheet rows.
// - `preview` / `spreadsheet`: text preview and `.xlsx` rendering.
// - `pipeline`: sequences authenticate, fetch, transform, preview, confirm
//   and write.
// - `cli` / `ui`: argument definitions and the interactive terminal flows.
pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod preview;
pub mod spreadsheet;
pub mod transform;
pub mod ui;

pub use error::{ApotekError, Result};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "apotek_tools=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
