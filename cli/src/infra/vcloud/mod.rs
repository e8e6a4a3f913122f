//! vCloud Director REST client implementing the infrastructure API ports.
//!
//! Every call carries the session token obtained at login and the versioned
//! JSON `Accept` header. Mutating calls answer with a task document whose id
//! the application layer then polls.

pub mod wire;

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use vcprov_common::{TaskSnapshot, VApp, VdcSummary};

use crate::application::ports::{
    CreatedVapp, Session, TaskTracker, VappInspector, VappLifecycle, VmConfigurator,
};
use crate::domain::config::ConnectionConfig;
use crate::domain::{ConfigError, VappNetworkConfig, VmNetworkConfig};

use wire::{
    GuestCustomizationSection, HardwareItem, InstantiateParams, InstantiationParams, QueryResult,
    Reference, Task, WireVapp, WireVdc,
};

const AUTH_HEADER: &str = "x-vcloud-authorization";

/// Connection parameters resolved from config and environment.
#[derive(Debug, Clone)]
pub struct VcloudSettings {
    pub base_url: String,
    pub org: String,
    pub username: String,
    pub password: String,
    pub api_version: String,
    pub insecure: bool,
    pub timeout: Duration,
}

impl VcloudSettings {
    /// # Errors
    ///
    /// Returns an error when the URL or any credential is missing.
    pub fn from_config(conn: &ConnectionConfig) -> Result<Self> {
        let base_url = conn
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?
            .trim_end_matches('/')
            .to_string();
        let require = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("no {name} configured (set VCPROV_{})", name.to_uppercase()))
        };
        Ok(Self {
            base_url,
            org: require(&conn.org, "org")?,
            username: require(&conn.username, "username")?,
            password: require(&conn.password, "password")?,
            api_version: conn.api_version.clone(),
            insecure: conn.insecure,
            timeout: Duration::from_secs(conn.request_timeout_secs),
        })
    }
}

/// HTTP client for the vCloud Director API.
pub struct VcloudClient {
    settings: VcloudSettings,
    http: Client,
    token: Mutex<Option<String>>,
}

impl VcloudClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: VcloudSettings) -> Result<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(settings.insecure)
            .timeout(settings.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            settings,
            http,
            token: Mutex::new(None),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.settings.base_url, path.trim_start_matches('/'))
    }

    fn accept(&self) -> String {
        format!("application/*+json;version={}", self.settings.api_version)
    }

    fn token(&self) -> Result<String> {
        self.token
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))?
            .clone()
            .ok_or_else(|| anyhow!("not logged in"))
    }

    fn set_token(&self, value: Option<String>) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))? = value;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.api_url(path);
        debug!(%method, %url, "vcloud request");
        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, self.accept())
            .header(AUTH_HEADER, self.token()?))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = builder.send().await.context("vCloud request failed")?;
        let resp = check_status(resp).await?;
        let body = resp.text().await.context("failed to read response body")?;
        parse_body(&body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.request(Method::PUT, path)?.json(body)).await
    }

    async fn task_from(&self, builder: RequestBuilder) -> Result<String> {
        let task: Task = self.send(builder).await?;
        Ok(task.id())
    }

    async fn vapp_action(&self, vapp_id: &str, action: &str) -> Result<String> {
        let path = format!("vApp/{vapp_id}/power/action/{action}");
        self.task_from(self.request(Method::POST, &path)?)
            .await
            .with_context(|| format!("{action} failed for vApp {vapp_id}"))
    }
}

/// Map non-success status codes to errors carrying the response body.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<wire::ApiError>(&body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(body);
    match status {
        StatusCode::UNAUTHORIZED => bail!("authentication failed: {detail}"),
        StatusCode::FORBIDDEN => bail!("permission denied: {detail}"),
        StatusCode::NOT_FOUND => bail!("not found: {detail}"),
        _ => bail!("vCloud API returned {status}: {detail}"),
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).context("failed to parse vCloud response")
}

impl Session for VcloudClient {
    async fn login(&self) -> Result<()> {
        let user = format!("{}@{}", self.settings.username, self.settings.org);
        let resp = self
            .http
            .post(self.api_url("sessions"))
            .header(reqwest::header::ACCEPT, self.accept())
            .basic_auth(&user, Some(&self.settings.password))
            .send()
            .await
            .with_context(|| format!("cannot reach {}", self.settings.base_url))?;
        let resp = check_status(resp).await?;
        let token = resp
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("login response carried no session token"))?
            .to_string();
        self.set_token(Some(token))?;
        debug!(user, "logged in");
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let resp = self
            .request(Method::DELETE, "session")?
            .send()
            .await
            .context("logout request failed")?;
        check_status(resp).await?;
        self.set_token(None)
    }
}

impl VappLifecycle for VcloudClient {
    async fn create_vapp_from_template(
        &self,
        vdc_id: &str,
        name: &str,
        description: &str,
        template_id: &str,
        network: &VappNetworkConfig,
    ) -> Result<CreatedVapp> {
        let body = InstantiateParams {
            name: name.to_string(),
            description: description.to_string(),
            deploy: true,
            power_on: false,
            source: Reference {
                href: self.api_url(&format!("vAppTemplate/{template_id}")),
                name: None,
                media_type: None,
            },
            instantiation_params: InstantiationParams {
                network_config_section: wire::network_config_section(
                    &self.settings.base_url,
                    network,
                ),
            },
        };
        let path = format!("vdc/{vdc_id}/action/instantiateVAppTemplate");
        let vapp: WireVapp = self
            .post_json(&path, &body)
            .await
            .with_context(|| format!("cannot instantiate template {template_id}"))?;
        let task_id = vapp
            .first_task()
            .map(Task::id)
            .ok_or_else(|| anyhow!("instantiation response carried no task"))?;
        Ok(CreatedVapp {
            vapp_id: wire::id_from_href(&vapp.href),
            task_id,
        })
    }

    async fn power_off_vapp(&self, vapp_id: &str) -> Result<String> {
        self.vapp_action(vapp_id, "powerOff").await
    }

    async fn power_on_vapp(&self, vapp_id: &str) -> Result<String> {
        self.vapp_action(vapp_id, "powerOn").await
    }

    async fn delete_vapp(&self, vapp_id: &str) -> Result<String> {
        let path = format!("vApp/{vapp_id}");
        self.task_from(self.request(Method::DELETE, &path)?)
            .await
            .with_context(|| format!("cannot delete vApp {vapp_id}"))
    }

    async fn set_vapp_network_config(
        &self,
        vapp_id: &str,
        network: &VappNetworkConfig,
    ) -> Result<String> {
        let body = wire::network_config_section(&self.settings.base_url, network);
        let path = format!("vApp/{vapp_id}/networkConfigSection");
        let task: Task = self
            .put_json(&path, &body)
            .await
            .with_context(|| format!("cannot configure networks of vApp {vapp_id}"))?;
        Ok(task.id())
    }
}

impl VappInspector for VcloudClient {
    async fn get_vapp(&self, vapp_id: &str) -> Result<VApp> {
        let vapp: WireVapp = self
            .get(&format!("vApp/{vapp_id}"))
            .await
            .with_context(|| format!("cannot read vApp {vapp_id}"))?;
        Ok(vapp.into_vapp())
    }

    async fn find_vapp(&self, reference: &str, vdc_id: Option<&str>) -> Result<Option<VApp>> {
        if reference.starts_with("vapp-") {
            return self.get_vapp(reference).await.map(Some);
        }
        let filter = match vdc_id {
            Some(vdc) => format!("name=={reference};vdc=={}", self.api_url(&format!("vdc/{vdc}"))),
            None => format!("name=={reference}"),
        };
        let result: QueryResult = self
            .send(
                self.request(Method::GET, "query")?
                    .query(&[("type", "vApp"), ("format", "references"), ("filter", filter.as_str())]),
            )
            .await
            .with_context(|| format!("cannot look up vApp '{reference}'"))?;
        match result.record.as_slice() {
            [] => Ok(None),
            [only] => self.get_vapp(&wire::id_from_href(&only.href)).await.map(Some),
            many => bail!(
                "{} vApps are named '{reference}'; use the vApp id instead",
                many.len()
            ),
        }
    }

    async fn get_vdc(&self, vdc_id: &str) -> Result<VdcSummary> {
        let vdc: WireVdc = self
            .get(&format!("vdc/{vdc_id}"))
            .await
            .with_context(|| format!("cannot read VDC {vdc_id}"))?;
        Ok(vdc.into_summary())
    }
}

impl VmConfigurator for VcloudClient {
    async fn set_vm_network_config(&self, vm_id: &str, config: &VmNetworkConfig) -> Result<String> {
        let body = wire::network_connection_section(config);
        let task: Task = self
            .put_json(&format!("vApp/{vm_id}/networkConnectionSection"), &body)
            .await
            .with_context(|| format!("cannot configure NICs of VM {vm_id}"))?;
        Ok(task.id())
    }

    async fn set_vm_guest_customization(
        &self,
        vm_id: &str,
        computer_name: &str,
        enabled: bool,
    ) -> Result<String> {
        let body = GuestCustomizationSection {
            enabled,
            computer_name: computer_name.to_string(),
        };
        let task: Task = self
            .put_json(&format!("vApp/{vm_id}/guestCustomizationSection"), &body)
            .await
            .with_context(|| format!("cannot set guest customization on VM {vm_id}"))?;
        Ok(task.id())
    }

    async fn set_vm_cpus(&self, vm_id: &str, count: u32) -> Result<String> {
        let task: Task = self
            .put_json(
                &format!("vApp/{vm_id}/virtualHardwareSection/cpu"),
                &HardwareItem::cpus(count),
            )
            .await
            .with_context(|| format!("cannot set CPU count on VM {vm_id}"))?;
        Ok(task.id())
    }

    async fn set_vm_ram(&self, vm_id: &str, megabytes: u32) -> Result<String> {
        let task: Task = self
            .put_json(
                &format!("vApp/{vm_id}/virtualHardwareSection/memory"),
                &HardwareItem::memory(megabytes),
            )
            .await
            .with_context(|| format!("cannot set memory on VM {vm_id}"))?;
        Ok(task.id())
    }
}

impl TaskTracker for VcloudClient {
    async fn task_status(&self, task_id: &str) -> Result<TaskSnapshot> {
        let task: Task = self
            .get(&format!("task/{task_id}"))
            .await
            .with_context(|| format!("cannot read task {task_id}"))?;
        Ok(task.snapshot())
    }
}
