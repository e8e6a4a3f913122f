//! Configuration-management hand-off through `knife bootstrap`.

use anyhow::{Result, bail};
use tracing::info;

use crate::application::ports::{Bootstrapper, CommandRunner};
use crate::domain::BootstrapParams;

/// Runs `knife bootstrap` against a freshly provisioned machine.
pub struct KnifeBootstrap<'a, R: CommandRunner> {
    runner: &'a R,
    knife_path: String,
}

impl<'a, R: CommandRunner> KnifeBootstrap<'a, R> {
    pub fn new(runner: &'a R, knife_path: impl Into<String>) -> Self {
        Self {
            runner,
            knife_path: knife_path.into(),
        }
    }
}

/// Argument vector for `knife bootstrap`, in the order knife documents them.
#[must_use]
pub fn knife_args(params: &BootstrapParams) -> Vec<String> {
    let mut args = vec![
        "bootstrap".to_string(),
        params.host.clone(),
        "-N".to_string(),
        params.node_name.clone(),
    ];
    let mut opt = |flag: &str, value: Option<String>| {
        if let Some(v) = value {
            args.push(flag.to_string());
            args.push(v);
        }
    };
    opt(
        "-r",
        (!params.run_list.is_empty()).then(|| params.run_list.join(",")),
    );
    opt("-x", Some(params.ssh_user.clone()));
    opt("-P", params.ssh_password.clone());
    opt(
        "-i",
        params
            .identity_file
            .as_ref()
            .map(|p| p.display().to_string()),
    );
    opt("-d", Some(params.distro.clone()));
    opt(
        "--template-file",
        params
            .template_file
            .as_ref()
            .map(|p| p.display().to_string()),
    );
    opt("--bootstrap-version", params.bootstrap_version.clone());
    opt("-E", params.environment.clone());
    opt("--bootstrap-protocol", params.protocol.clone());
    opt("--bootstrap-proxy", params.proxy.clone());
    let attrs = match &params.first_boot_attributes {
        serde_json::Value::Null => None,
        serde_json::Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    };
    opt("-j", attrs);
    if params.use_sudo {
        args.push("--sudo".to_string());
    }
    if params.no_host_key_verify {
        args.push("--no-host-key-verify".to_string());
    }
    args
}

impl<R: CommandRunner> Bootstrapper for KnifeBootstrap<'_, R> {
    async fn bootstrap(&self, params: &BootstrapParams) -> Result<()> {
        let args = knife_args(params);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        info!(host = %params.host, node = %params.node_name, "running knife bootstrap");
        let status = self.runner.run_status(&self.knife_path, &argv).await?;
        if !status.success() {
            bail!(
                "knife bootstrap of {} exited with {}",
                params.host,
                status
                    .code()
                    .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
            );
        }
        Ok(())
    }
}
