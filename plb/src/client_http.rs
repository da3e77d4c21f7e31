//! `reqwest`-based `HypervisorClient` implementation against the Proxmox VE
//! REST API, following `horcrux-cli::api::ApiClient`'s shape: a bearer/ticket
//! token held behind an `RwLock`, `get`/`post` helpers that deserialize a
//! `DeserializeOwned` body and turn non-2xx responses into `anyhow::bail!`.

use crate::config::ProxmoxConfig;
use anyhow::Result;
use plb_core::client::{HypervisorClient, RawNode, RawVm, RawVmConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Proxmox wraps every response body in `{"data": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TicketData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

pub struct ProxmoxClient {
    base_url: String,
    user: String,
    pass: String,
    http: reqwest::Client,
    ticket: Arc<RwLock<Option<String>>>,
    csrf_token: Arc<RwLock<Option<String>>>,
}

impl ProxmoxClient {
    pub fn new(config: &ProxmoxConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            base_url: config.api_host.trim_end_matches('/').to_string(),
            user: config.api_user.clone(),
            pass: config.api_pass.clone(),
            http,
            ticket: Arc::new(RwLock::new(None)),
            csrf_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Exchange username/password for a ticket + CSRF-prevention token pair.
    /// Idempotent — safe to call again once the ticket has expired.
    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/api2/json/access/ticket", self.base_url);
        let params = [("username", self.user.as_str()), ("password", self.pass.as_str())];

        let response = self.http.post(&url).form(&params).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Proxmox authentication failed: {}", response.status());
        }

        let envelope: Envelope<TicketData> = response.json().await?;
        *self.ticket.write().await = Some(envelope.data.ticket);
        *self.csrf_token.write().await = Some(envelope.data.csrf_token);
        Ok(())
    }

    async fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/api2/json{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(ticket) = self.ticket.read().await.clone() {
            request = request.header("Cookie", format!("PVEAuthCookie={ticket}"));
        }
        if method != reqwest::Method::GET {
            if let Some(csrf) = self.csrf_token.read().await.clone() {
                request = request.header("CSRFPreventionToken", csrf);
            }
        }

        request
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.build_request(reqwest::Method::GET, path).await.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Proxmox API request failed: {status} - {body}");
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let response = self.build_request(reqwest::Method::POST, path).await.form(body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Proxmox API request failed: {status} - {text}");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct MigrateRequest {
    target: String,
    online: u8,
}

#[async_trait::async_trait]
impl HypervisorClient for ProxmoxClient {
    async fn list_nodes(&self) -> Result<Vec<RawNode>> {
        self.get("/nodes").await
    }

    async fn list_vms(&self, node: &str) -> Result<Vec<RawVm>> {
        self.get(&format!("/nodes/{node}/qemu")).await
    }

    async fn get_vm_config(&self, node: &str, vmid: u32) -> Result<RawVmConfig> {
        self.get(&format!("/nodes/{node}/qemu/{vmid}/config")).await
    }

    async fn migrate(&self, node: &str, vmid: u32, target: &str, online: bool) -> Result<()> {
        let request = MigrateRequest { target: target.to_string(), online: online as u8 };
        self.post(&format!("/nodes/{node}/qemu/{vmid}/migrate"), &request).await
    }
}
