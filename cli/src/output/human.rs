//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;
use vcprov_common::VApp;

use crate::application::services::inventory::VdcOverview;
use crate::domain::{ProvisionedVapp, StageFailure, VcprovConfig};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Summary printed after a successful `server create`.
    pub fn render_provisioned(&self, done: &ProvisionedVapp) {
        self.ctx.success(&format!("vApp {} is ready", done.vapp_id));
        self.ctx.kv("vApp id:", &done.vapp_id);
        self.ctx.kv("VM id:", &done.vm_id);
        self.ctx.kv("Primary address:", &done.primary_address);
        if let Some(addr) = &done.secondary_address {
            self.ctx.kv("Secondary address:", addr);
        }
    }

    /// Error line plus any operator guidance. Never suppressed.
    pub fn render_failure(&self, failure: &StageFailure) {
        let mut lines = failure.message.lines();
        let first = lines.next().unwrap_or_default();
        self.ctx.error(&format!(
            "{} failed ({}): {first}",
            failure.stage, failure.error_kind
        ));
        for line in lines {
            eprintln!("    {line}");
        }
    }

    /// One-line confirmation such as `vApp vapp-1: powered off`.
    pub fn render_action(&self, result: &str, id: &str) {
        self.ctx.success(&format!("{id}: {result}"));
    }

    /// Name, id, status, VMs and addresses of one vApp.
    pub fn render_vapp(&self, vapp: &VApp) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.header(&vapp.name);
        self.ctx.kv("ID:", &vapp.id);
        self.ctx.kv("Status:", vapp.status.label());
        self.ctx
            .kv("Primary address:", vapp.primary_address.as_deref().unwrap_or("-"));
        if let Some(addr) = &vapp.secondary_address {
            self.ctx.kv("Secondary address:", addr);
        }
        if vapp.vms.is_empty() {
            return;
        }
        println!();
        self.ctx.header("VMs:");
        for vm in vapp.vms.values() {
            let addrs = if vm.addresses.is_empty() {
                "-".to_string()
            } else {
                vm.addresses.join(", ")
            };
            println!(
                "  {}  {}  {}  {}",
                vm.name.style(self.ctx.styles.bold),
                vm.id.style(self.ctx.styles.dim),
                vm.status.label(),
                addrs
            );
        }
    }

    /// VDC header followed by one line per vApp.
    pub fn render_vdc(&self, overview: &VdcOverview) {
        if self.ctx.quiet {
            return;
        }
        let vdc = &overview.vdc;
        self.ctx.header(&vdc.name);
        self.ctx.kv("ID:", &vdc.id);
        if !vdc.description.is_empty() {
            self.ctx.kv("Description:", &vdc.description);
        }
        if !vdc.networks.is_empty() {
            self.ctx.kv("Networks:", &vdc.networks.join(", "));
        }
        println!();
        if overview.vapps.is_empty() {
            self.ctx.info("No vApps");
            return;
        }
        self.ctx.header("vApps:");
        let width = overview
            .vapps
            .iter()
            .map(|v| v.name.len())
            .max()
            .unwrap_or(0);
        for vapp in &overview.vapps {
            println!(
                "  {:<width$}  {}  {:<12}  {}",
                vapp.name,
                vapp.id.style(self.ctx.styles.dim),
                vapp.status.label(),
                vapp.primary_address.as_deref().unwrap_or("-"),
            );
        }
    }

    /// Config values with the password masked.
    pub fn render_config(&self, config: &VcprovConfig, path: &Path) {
        let shown = config.redacted();
        self.ctx.header("Configuration");
        self.ctx.kv("File:", &path.display().to_string());
        println!();
        let c = &shown.connection;
        let unset = "(not set)";
        self.ctx.kv("connection.url:", c.url.as_deref().unwrap_or(unset));
        self.ctx.kv("connection.org:", c.org.as_deref().unwrap_or(unset));
        self.ctx
            .kv("connection.username:", c.username.as_deref().unwrap_or(unset));
        self.ctx
            .kv("connection.password:", c.password.as_deref().unwrap_or(unset));
        self.ctx.kv("connection.api_version:", &c.api_version);
        self.ctx.kv("connection.insecure:", &c.insecure.to_string());
        self.ctx
            .kv("connection.request_timeout_secs:", &c.request_timeout_secs.to_string());
        let p = &shown.polling;
        self.ctx
            .kv("polling.task_interval_secs:", &p.task_interval_secs.to_string());
        self.ctx
            .kv("polling.address_attempts:", &p.address_attempts.to_string());
        self.ctx
            .kv("polling.address_interval_secs:", &p.address_interval_secs.to_string());
        self.ctx.kv(
            "polling.probe_connect_timeout_secs:",
            &p.probe_connect_timeout_secs.to_string(),
        );
        self.ctx
            .kv("polling.probe_retry_delay_secs:", &p.probe_retry_delay_secs.to_string());
        self.ctx
            .kv("polling.ready_settle_secs:", &p.ready_settle_secs.to_string());
        self.ctx.kv("polling.ssh_port:", &p.ssh_port.to_string());
        self.ctx.kv(
            "polling.max_probe_attempts:",
            &p.max_probe_attempts
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
        );
        let b = &shown.bootstrap;
        self.ctx.kv("bootstrap.knife_path:", &b.knife_path);
        self.ctx.kv("bootstrap.distro:", &b.distro);
        self.ctx.kv("bootstrap.ssh_user:", &b.ssh_user);
    }

    pub fn render_version(&self, version: &str) {
        println!("vcprov {version}");
    }
}
