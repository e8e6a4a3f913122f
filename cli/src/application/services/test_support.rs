//! Scriptable fakes of the port traits shared by the service tests.
//!
//! `FakeApi` keeps one in-memory vApp and hands out sequential task ids.
//! Every call is appended to a log so tests can assert what was (and was not)
//! issued.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use tokio::time::Instant;
use vcprov_common::{
    PowerState, TaskSnapshot, TaskStatus, VApp, VappRef, VdcSummary, VmSummary,
};

use crate::application::ports::{
    BannerStream, Bootstrapper, CreatedVapp, PortDialer, ProgressReporter, Session, TaskTracker,
    VappInspector, VappLifecycle, VmConfigurator,
};
use crate::domain::{BootstrapParams, VappNetworkConfig, VmNetworkConfig};

// ── Infrastructure API fake ──────────────────────────────────────────────────

#[derive(Default)]
struct FakeState {
    next_task: u32,
    tasks: HashMap<String, (&'static str, usize)>,
    vapp: Option<VApp>,
    fetches_while_on: usize,
}

pub struct FakeApi {
    calls: Mutex<Vec<&'static str>>,
    state: Mutex<FakeState>,
    initial_power: PowerState,
    address_after: Option<usize>,
    primary_address: String,
    secondary_address: Option<String>,
    running_polls: usize,
    failing_tasks: HashMap<&'static str, String>,
    failing_calls: HashSet<&'static str>,
    vm_ids: Vec<String>,
    fail_logout: bool,
    /// While set, `get_vapp` never resolves.
    pub hang_fetch: AtomicBool,
    pub vm_network: Mutex<Option<VmNetworkConfig>>,
    pub vapp_network: Mutex<Option<VappNetworkConfig>>,
    pub guest: Mutex<Option<(String, bool)>>,
    pub cpus: Mutex<Option<u32>>,
    pub ram: Mutex<Option<u32>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(FakeState::default()),
            initial_power: PowerState::PoweredOn,
            address_after: Some(1),
            primary_address: "10.0.0.5".to_string(),
            secondary_address: None,
            running_polls: 0,
            failing_tasks: HashMap::new(),
            failing_calls: HashSet::new(),
            vm_ids: vec!["vm-1".to_string()],
            fail_logout: false,
            hang_fetch: AtomicBool::new(false),
            vm_network: Mutex::new(None),
            vapp_network: Mutex::new(None),
            guest: Mutex::new(None),
            cpus: Mutex::new(None),
            ram: Mutex::new(None),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A vApp `vapp-1` already exists with the given power state.
    pub fn with_existing_vapp(self, status: PowerState) -> Self {
        self.state.lock().unwrap().vapp = Some(self.build_vapp("web01", status));
        self
    }

    /// Power state the vApp has right after instantiation.
    pub fn with_initial_power(mut self, status: PowerState) -> Self {
        self.initial_power = status;
        self
    }

    /// Primary address shows up on the `n`th fetch after power-on; `None`
    /// never assigns one.
    pub fn with_address_after(mut self, n: Option<usize>) -> Self {
        self.address_after = n;
        self
    }

    pub fn with_secondary_address(mut self, addr: &str) -> Self {
        self.secondary_address = Some(addr.to_string());
        self
    }

    /// Every task reports `running` this many times before its terminal status.
    pub fn with_running_polls(mut self, n: usize) -> Self {
        self.running_polls = n;
        self
    }

    /// The task issued by `op` ends in `error` with `reason`.
    pub fn with_failing_task(mut self, op: &'static str, reason: &str) -> Self {
        self.failing_tasks.insert(op, reason.to_string());
        self
    }

    /// The API call `op` itself is rejected.
    pub fn with_failing_call(mut self, op: &'static str) -> Self {
        self.failing_calls.insert(op);
        self
    }

    pub fn with_vms(mut self, ids: &[&str]) -> Self {
        self.vm_ids = ids.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn called(&self, op: &str) -> bool {
        self.count(op) > 0
    }

    pub fn vapp_exists(&self) -> bool {
        self.state.lock().unwrap().vapp.is_some()
    }

    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.failing_calls.contains(op) {
            bail!("{op} rejected by control plane");
        }
        Ok(())
    }

    fn issue(&self, op: &'static str) -> Result<String> {
        self.record(op)?;
        let mut state = self.state.lock().unwrap();
        state.next_task += 1;
        let id = format!("task-{}", state.next_task);
        state.tasks.insert(id.clone(), (op, 0));
        Ok(id)
    }

    fn task_succeeds(&self, op: &str) -> bool {
        !self.failing_tasks.contains_key(op)
    }

    fn set_power(&self, status: PowerState) {
        let mut state = self.state.lock().unwrap();
        if status == PowerState::PoweredOn {
            state.fetches_while_on = 0;
        }
        if let Some(vapp) = state.vapp.as_mut() {
            vapp.status = status;
            for vm in vapp.vms.values_mut() {
                vm.status = status;
            }
        }
    }

    fn build_vapp(&self, name: &str, status: PowerState) -> VApp {
        let vms = self
            .vm_ids
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    VmSummary {
                        id: id.clone(),
                        name: format!("{name}-{id}"),
                        status,
                        addresses: Vec::new(),
                    },
                )
            })
            .collect();
        VApp {
            id: "vapp-1".to_string(),
            name: name.to_string(),
            status,
            vms,
            primary_address: None,
            secondary_address: None,
        }
    }
}

impl Session for FakeApi {
    async fn login(&self) -> Result<()> {
        self.record("login")
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout")?;
        if self.fail_logout {
            bail!("session already expired");
        }
        Ok(())
    }
}

impl VappLifecycle for FakeApi {
    async fn create_vapp_from_template(
        &self,
        _vdc_id: &str,
        name: &str,
        _description: &str,
        _template_id: &str,
        network: &VappNetworkConfig,
    ) -> Result<CreatedVapp> {
        let task_id = self.issue("create_vapp_from_template")?;
        *self.vapp_network.lock().unwrap() = Some(network.clone());
        let vapp = self.build_vapp(name, self.initial_power);
        self.state.lock().unwrap().vapp = Some(vapp);
        Ok(CreatedVapp {
            vapp_id: "vapp-1".to_string(),
            task_id,
        })
    }

    async fn power_off_vapp(&self, _vapp_id: &str) -> Result<String> {
        let id = self.issue("power_off_vapp")?;
        if self.task_succeeds("power_off_vapp") {
            self.set_power(PowerState::PoweredOff);
        }
        Ok(id)
    }

    async fn power_on_vapp(&self, _vapp_id: &str) -> Result<String> {
        let id = self.issue("power_on_vapp")?;
        if self.task_succeeds("power_on_vapp") {
            self.set_power(PowerState::PoweredOn);
        }
        Ok(id)
    }

    async fn delete_vapp(&self, _vapp_id: &str) -> Result<String> {
        let id = self.issue("delete_vapp")?;
        if self.task_succeeds("delete_vapp") {
            self.state.lock().unwrap().vapp = None;
        }
        Ok(id)
    }

    async fn set_vapp_network_config(
        &self,
        _vapp_id: &str,
        network: &VappNetworkConfig,
    ) -> Result<String> {
        let id = self.issue("set_vapp_network_config")?;
        *self.vapp_network.lock().unwrap() = Some(network.clone());
        Ok(id)
    }
}

impl VappInspector for FakeApi {
    async fn get_vapp(&self, vapp_id: &str) -> Result<VApp> {
        self.record("get_vapp")?;
        if self.hang_fetch.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock().unwrap();
        if state.vapp.as_ref().is_some_and(|v| v.status == PowerState::PoweredOn) {
            state.fetches_while_on += 1;
        }
        let fetches = state.fetches_while_on;
        let Some(vapp) = state.vapp.as_mut().filter(|v| v.id == vapp_id) else {
            bail!("vApp {vapp_id} not found");
        };
        if vapp.status == PowerState::PoweredOn && self.address_after.is_some_and(|n| fetches >= n) {
            vapp.primary_address = Some(self.primary_address.clone());
            vapp.secondary_address.clone_from(&self.secondary_address);
        }
        Ok(vapp.clone())
    }

    async fn find_vapp(&self, reference: &str, _vdc_id: Option<&str>) -> Result<Option<VApp>> {
        self.record("find_vapp")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .vapp
            .as_ref()
            .filter(|v| v.id == reference || v.name == reference)
            .cloned())
    }

    async fn get_vdc(&self, vdc_id: &str) -> Result<VdcSummary> {
        self.record("get_vdc")?;
        let state = self.state.lock().unwrap();
        Ok(VdcSummary {
            id: vdc_id.to_string(),
            name: "Pool A".to_string(),
            description: "test pool".to_string(),
            vapps: state
                .vapp
                .iter()
                .map(|v| VappRef {
                    id: v.id.clone(),
                    name: v.name.clone(),
                })
                .collect(),
            networks: vec!["Net-A".to_string()],
        })
    }
}

impl VmConfigurator for FakeApi {
    async fn set_vm_network_config(
        &self,
        _vm_id: &str,
        config: &VmNetworkConfig,
    ) -> Result<String> {
        let id = self.issue("set_vm_network_config")?;
        *self.vm_network.lock().unwrap() = Some(config.clone());
        Ok(id)
    }

    async fn set_vm_guest_customization(
        &self,
        _vm_id: &str,
        computer_name: &str,
        enabled: bool,
    ) -> Result<String> {
        let id = self.issue("set_vm_guest_customization")?;
        *self.guest.lock().unwrap() = Some((computer_name.to_string(), enabled));
        Ok(id)
    }

    async fn set_vm_cpus(&self, _vm_id: &str, count: u32) -> Result<String> {
        let id = self.issue("set_vm_cpus")?;
        *self.cpus.lock().unwrap() = Some(count);
        Ok(id)
    }

    async fn set_vm_ram(&self, _vm_id: &str, megabytes: u32) -> Result<String> {
        let id = self.issue("set_vm_ram")?;
        *self.ram.lock().unwrap() = Some(megabytes);
        Ok(id)
    }
}

impl TaskTracker for FakeApi {
    async fn task_status(&self, task_id: &str) -> Result<TaskSnapshot> {
        self.record("task_status")?;
        let mut state = self.state.lock().unwrap();
        let Some((op, polls)) = state.tasks.get_mut(task_id) else {
            bail!("unknown task {task_id}");
        };
        *polls += 1;
        let (status, error_message) = if *polls <= self.running_polls {
            (TaskStatus::Running, None)
        } else if let Some(reason) = self.failing_tasks.get(*op) {
            (TaskStatus::Error, Some(reason.clone()))
        } else {
            (TaskStatus::Success, None)
        };
        Ok(TaskSnapshot {
            id: task_id.to_string(),
            status,
            error_message,
        })
    }
}

// ── Readiness probe fakes ────────────────────────────────────────────────────

/// What one connect attempt of `FakeDialer` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dial {
    Refused,
    HostUnreachable,
    NetUnreachable,
    Reset,
    TimedOut,
    PermissionDenied,
    /// Connect never completes.
    Hang,
    /// Connects and sends a banner.
    Banner,
    /// Connects, then the peer closes without a banner.
    Closed,
    /// Connects, then the read fails with a reset.
    ResetOnRead,
}

pub struct FakeConn {
    dial: Dial,
    closed: Arc<AtomicUsize>,
}

impl BannerStream for FakeConn {
    async fn read_banner(&mut self) -> io::Result<usize> {
        match self.dial {
            Dial::Banner => Ok(b"SSH-2.0-OpenSSH_9.6\r\n".len()),
            Dial::ResetOnRead => Err(io::ErrorKind::ConnectionReset.into()),
            _ => Ok(0),
        }
    }
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Dialer that plays back a script of outcomes, repeating `fallback` once
/// the script is exhausted.
pub struct FakeDialer {
    script: Mutex<VecDeque<Dial>>,
    fallback: Dial,
    pub attempts: Mutex<Vec<Instant>>,
    pub hosts: Mutex<Vec<(String, u16)>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeDialer {
    pub fn new(script: &[Dial], fallback: Dial) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            fallback,
            attempts: Mutex::new(Vec::new()),
            hosts: Mutex::new(Vec::new()),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Accepts on the first attempt.
    pub fn ready() -> Self {
        Self::new(&[], Dial::Banner)
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl PortDialer for FakeDialer {
    type Conn = FakeConn;

    async fn connect(&self, host: &str, port: u16) -> io::Result<FakeConn> {
        self.attempts.lock().unwrap().push(Instant::now());
        self.hosts.lock().unwrap().push((host.to_string(), port));
        let dial = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
        let kind = match dial {
            Dial::Refused => io::ErrorKind::ConnectionRefused,
            Dial::HostUnreachable => io::ErrorKind::HostUnreachable,
            Dial::NetUnreachable => io::ErrorKind::NetworkUnreachable,
            Dial::Reset => io::ErrorKind::ConnectionReset,
            Dial::TimedOut => io::ErrorKind::TimedOut,
            Dial::PermissionDenied => io::ErrorKind::PermissionDenied,
            Dial::Hang => return std::future::pending().await,
            Dial::Banner | Dial::Closed | Dial::ResetOnRead => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                return Ok(FakeConn {
                    dial,
                    closed: Arc::clone(&self.closed),
                });
            }
        };
        Err(kind.into())
    }
}

// ── Bootstrap and reporter fakes ─────────────────────────────────────────────

#[derive(Default)]
pub struct FakeBootstrapper {
    pub invocations: Mutex<Vec<BootstrapParams>>,
    pub fail: bool,
}

impl Bootstrapper for FakeBootstrapper {
    async fn bootstrap(&self, params: &BootstrapParams) -> Result<()> {
        self.invocations.lock().unwrap().push(params.clone());
        if self.fail {
            bail!("knife exited with status 1");
        }
        Ok(())
    }
}

/// Reporter that keeps every message, prefixed by its level.
#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("warn: {message}"));
    }
}
