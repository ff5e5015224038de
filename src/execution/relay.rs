use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{sleep, Duration};

use crate::error::RelayError;
use crate::execution::account::SignedTransaction;

const DEFAULT_SLOT_INTERVAL_MS: u64 = 500;
const DEFAULT_MAX_STATUS_POLLS: u32 = 20;

/// Signed transactions wrapped for private relay submission
#[derive(Debug, Clone)]
pub struct BundlePayload {
    pub transactions: Vec<String>,
}

impl BundlePayload {
    pub fn single(signed: &SignedTransaction) -> Self {
        Self {
            transactions: vec![signed.raw_hex()],
        }
    }
}

/// Handle to a submitted bundle, used to await its fate
#[derive(Debug, Clone)]
pub struct BundleTicket {
    pub bundle_id: String,
    pub target_slot: u64,
}

/// Relay's verdict once the target slot has been produced
#[derive(Debug, Clone, PartialEq)]
pub enum InclusionStatus {
    Included { slot: u64, receipt: String },
    NotIncluded,
}

/// Private bundle relay collaborator
///
/// Submission addresses a specific future slot; awaiting blocks until
/// that slot has been reached or passed.
#[async_trait]
pub trait BundleRelay: Send + Sync {
    async fn submit(
        &self,
        payload: &BundlePayload,
        target_slot: u64,
        idempotency_token: &str,
    ) -> std::result::Result<BundleTicket, RelayError>;

    async fn await_inclusion(
        &self,
        ticket: &BundleTicket,
    ) -> std::result::Result<InclusionStatus, RelayError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleStatus {
    status: String,
    slot: Option<u64>,
    #[serde(default)]
    receipt: Option<String>,
}

/// JSON-RPC client for a private bundle relay
#[derive(Clone)]
pub struct HttpBundleRelay {
    client: Client,
    relay_url: String,
    slot_interval: Duration,
    max_status_polls: u32,
}

impl HttpBundleRelay {
    pub fn new(relay_url: String) -> Self {
        Self {
            client: Client::new(),
            relay_url,
            slot_interval: Duration::from_millis(DEFAULT_SLOT_INTERVAL_MS),
            max_status_polls: DEFAULT_MAX_STATUS_POLLS,
        }
    }

    /// Override the status poll cadence (one poll per slot interval)
    pub fn with_slot_interval(mut self, slot_interval: Duration) -> Self {
        self.slot_interval = slot_interval;
        self
    }

    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> std::result::Result<T, RelayError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcResponse<T> = self
            .client
            .post(&self.relay_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            // Relays report unknown bundles as a distinct error class
            if err.message.contains("not found") {
                return Err(RelayError::NotFound);
            }
            return Err(RelayError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response.result.ok_or(RelayError::NotFound)
    }
}

#[async_trait]
impl BundleRelay for HttpBundleRelay {
    async fn submit(
        &self,
        payload: &BundlePayload,
        target_slot: u64,
        idempotency_token: &str,
    ) -> std::result::Result<BundleTicket, RelayError> {
        let bundle_id: String = self
            .rpc_call(
                "sendBundle",
                json!([{
                    "transactions": payload.transactions,
                    "targetSlot": target_slot,
                    "replacementUuid": idempotency_token,
                }]),
            )
            .await?;

        tracing::debug!(
            "bundle {} accepted by relay for slot {}",
            bundle_id,
            target_slot
        );

        Ok(BundleTicket {
            bundle_id,
            target_slot,
        })
    }

    /// Poll bundle status at the slot cadence until the relay reports a
    /// terminal state or the target slot has passed without inclusion
    async fn await_inclusion(
        &self,
        ticket: &BundleTicket,
    ) -> std::result::Result<InclusionStatus, RelayError> {
        for _ in 0..self.max_status_polls {
            let status: BundleStatus = match self
                .rpc_call("getBundleStatus", json!([ticket.bundle_id]))
                .await
            {
                Ok(status) => status,
                // An unknown bundle is ordinary non-inclusion
                Err(RelayError::NotFound) => return Ok(InclusionStatus::NotIncluded),
                Err(e) => return Err(e),
            };

            match status.status.as_str() {
                "included" => {
                    let slot = status.slot.unwrap_or(ticket.target_slot);
                    return Ok(InclusionStatus::Included {
                        slot,
                        receipt: status.receipt.unwrap_or_default(),
                    });
                }
                "not_included" => return Ok(InclusionStatus::NotIncluded),
                // Still pending: the target slot has not been produced yet
                _ => sleep(self.slot_interval).await,
            }
        }

        Ok(InclusionStatus::NotIncluded)
    }
}
