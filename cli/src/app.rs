//! Application context: unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! no command signature changes.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::application::services::config_service;
use crate::domain::VcprovConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::{YamlConfigStore, env_overrides};
use crate::infra::vcloud::{VcloudClient, VcloudSettings};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags passed from the top-level CLI.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` and passed as `&AppContext`.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// On-disk configuration store.
    pub config_store: YamlConfigStore,
    /// Process runner used for the bootstrap hand-off.
    pub runner: TokioCommandRunner,
    /// Cancelled on Ctrl-C.
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// In JSON mode progress lines are suppressed so stdout carries only the
    /// final document.
    #[must_use]
    pub fn new(flags: &OutputFlags, cancel: CancellationToken) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
            config_store: YamlConfigStore,
            runner: TokioCommandRunner,
            cancel,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Config file overlaid with `VCPROV_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the environment is
    /// not valid unicode.
    pub fn config(&self) -> Result<VcprovConfig> {
        config_service::load_config(&self.config_store, &env_overrides()?)
    }

    /// Build a vCloud client from the resolved connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or a credential is missing.
    pub fn vcloud(&self, config: &VcprovConfig) -> Result<VcloudClient> {
        VcloudClient::new(VcloudSettings::from_config(&config.connection)?)
    }
}
