//! Provisioning pipeline.
//!
//! `Requested → Created → PoweredOff → NetworkConfigured → GuestCustomized →
//! [CpuResized] → [RamResized] → PoweredOn → AddressAcquired →
//! [ReadinessConfirmed → Handoff] → Done`
//!
//! Stages run strictly one after another. The first failure ends the run and
//! is reported with the stage that was being attempted. Nothing is rolled
//! back; a vApp that was already created stays in place and the failure
//! message tells the operator how to find and remove it.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::application::ports::{Bootstrapper, InfrastructureApi, PortDialer, ProgressReporter};
use crate::application::services::address::await_address;
use crate::application::services::cancel::{or_cancel, sleep_or_cancel};
use crate::application::services::task_poller::await_task;
use crate::application::services::{compute, network, power, readiness};
use crate::domain::{
    BootstrapParams, PollPolicy, ProvisionError, ProvisionedVapp, ProvisioningOutcome,
    ProvisioningRequest, Stage, StageFailure,
};

/// Collaborators and policy for one provisioning run.
pub struct Orchestrator<'a, A, D, B, R> {
    pub api: &'a A,
    pub dialer: &'a D,
    pub bootstrapper: &'a B,
    pub reporter: &'a R,
    pub policy: PollPolicy,
    pub cancel: CancellationToken,
}

/// Where a run currently is. The stage is the one being attempted.
#[derive(Debug)]
pub(super) struct Progress {
    pub(super) stage: Stage,
    pub(super) vapp_id: Option<String>,
}

impl Progress {
    pub(super) fn new() -> Self {
        Self {
            stage: Stage::Requested,
            vapp_id: None,
        }
    }

    pub(super) fn enter(&mut self, stage: Stage) {
        info!(stage = %stage, vapp_id = self.vapp_id.as_deref(), "entering stage");
        self.stage = stage;
    }
}

impl<A, D, B, R> Orchestrator<'_, A, D, B, R>
where
    A: InfrastructureApi,
    D: PortDialer,
    B: Bootstrapper,
    R: ProgressReporter,
{
    /// Run the pipeline once and produce its outcome.
    pub async fn provision(&self, request: &ProvisioningRequest) -> ProvisioningOutcome {
        let mut progress = Progress::new();
        match self.drive(request, &mut progress).await {
            Ok(done) => {
                info!(vapp_id = %done.vapp_id, reached = %done.reached, "provisioning done");
                ProvisioningOutcome::Provisioned(done)
            }
            Err(err) => {
                let failure =
                    StageFailure::new(progress.stage, &err, progress.vapp_id.as_deref());
                error!(
                    stage = %failure.stage,
                    kind = %failure.error_kind,
                    error = %err,
                    "provisioning failed"
                );
                ProvisioningOutcome::Failed(failure)
            }
        }
    }

    async fn drive(
        &self,
        req: &ProvisioningRequest,
        progress: &mut Progress,
    ) -> Result<ProvisionedVapp, ProvisionError> {
        let api = self.api;
        let policy = &self.policy;
        let cancel = &self.cancel;

        req.validate()?;
        let vm_network = req.vm_network.normalized()?;

        // ── Created ──
        progress.enter(Stage::Created);
        self.reporter.step(&format!(
            "Creating vApp {} from template {}...",
            req.name, req.template_id
        ));
        let created = api
            .create_vapp_from_template(
                &req.vdc_id,
                &req.name,
                &req.description,
                &req.template_id,
                &req.vapp_network,
            )
            .await
            .with_context(|| format!("instantiating template {}", req.template_id))?;
        let vapp_id = created.vapp_id.clone();
        progress.vapp_id = Some(vapp_id.clone());
        await_task(api, &created.task_id, policy.task_interval, cancel).await?;
        let vapp = or_cancel(cancel, api.get_vapp(&vapp_id))
            .await?
            .with_context(|| format!("fetching vApp {vapp_id}"))?;
        let vm_id = vapp
            .primary_vm()
            .map(|vm| vm.id.clone())
            .ok_or_else(|| {
                ProvisionError::PreconditionViolation(format!("vApp {vapp_id} contains no VM"))
            })?;
        self.reporter
            .success(&format!("vApp created with ID {vapp_id} (VM {vm_id})"));

        // ── PoweredOff ──
        progress.enter(Stage::PoweredOff);
        self.reporter.step("Stopping vApp...");
        power::ensure_powered_off(api, &vapp, policy, cancel).await?;
        self.reporter.success("vApp stopped");

        // ── NetworkConfigured ──
        progress.enter(Stage::NetworkConfigured);
        self.reporter.step("Configuring VM network...");
        let task = network::configure_vm_network(api, &vm_id, &vm_network).await?;
        await_task(api, &task, policy.task_interval, cancel).await?;
        self.reporter.success("VM network configured");

        // ── GuestCustomized ──
        progress.enter(Stage::GuestCustomized);
        self.reporter.step("Configuring guest customization...");
        let task = api
            .set_vm_guest_customization(&vm_id, &req.name, req.guest_customization)
            .await
            .with_context(|| format!("customizing guest of VM {vm_id}"))?;
        await_task(api, &task, policy.task_interval, cancel).await?;
        self.reporter.success("Guest customization configured");

        // ── CpuResized / RamResized ──
        if let Some(cpus) = req.cpus {
            progress.enter(Stage::CpuResized);
            self.reporter.step(&format!("Setting CPUs to {cpus}..."));
            let task = compute::resize_cpu(api, &vm_id, cpus).await?;
            await_task(api, &task, policy.task_interval, cancel).await?;
        }
        if let Some(megabytes) = req.memory_mb {
            progress.enter(Stage::RamResized);
            self.reporter.step(&format!("Setting memory to {megabytes} MB..."));
            let task = compute::resize_ram(api, &vm_id, megabytes).await?;
            await_task(api, &task, policy.task_interval, cancel).await?;
        }

        // ── PoweredOn ──
        progress.enter(Stage::PoweredOn);
        self.reporter.step("Starting vApp...");
        power::power_on(api, &vapp_id, policy, cancel).await?;
        self.reporter.success("vApp started");

        // ── AddressAcquired ──
        progress.enter(Stage::AddressAcquired);
        self.reporter.step("Waiting for an IP address...");
        let addresses = await_address(api, &vapp_id, policy, cancel).await?;
        self.reporter
            .success(&format!("Address assigned: {}", addresses.primary));

        let mut done = ProvisionedVapp {
            vapp_id,
            vm_id,
            primary_address: addresses.primary,
            secondary_address: addresses.secondary,
            reached: Stage::AddressAcquired,
        };
        let Some(settings) = req.bootstrap.as_ref() else {
            return Ok(done);
        };

        // ── ReadinessConfirmed ──
        progress.enter(Stage::ReadinessConfirmed);
        self.reporter.step(&format!(
            "Waiting for sshd on {}:{}...",
            done.primary_address, policy.ssh_port
        ));
        readiness::await_tcp_ready(
            self.dialer,
            self.reporter,
            &done.primary_address,
            policy.ssh_port,
            policy,
            cancel,
        )
        .await?;
        sleep_or_cancel(policy.ready_settle, cancel).await?;
        self.reporter.success("sshd is up");
        done.reached = Stage::ReadinessConfirmed;

        // ── Handoff ──
        progress.enter(Stage::Handoff);
        let params = BootstrapParams::for_node(&done.primary_address, req, settings);
        self.reporter
            .step(&format!("Bootstrapping node {}...", params.node_name));
        self.bootstrapper
            .bootstrap(&params)
            .await
            .with_context(|| format!("bootstrapping {}", params.host))?;
        done.reached = Stage::Handoff;
        Ok(done)
    }
}
