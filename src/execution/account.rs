use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::execution::tx::Transaction;
use crate::Result;

type HmacSha256 = Hmac<Sha256>;

/// A signed transaction: the canonical bytes plus their signature
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub signature: String,
}

impl SignedTransaction {
    /// Hex form of the raw bytes, as the relay expects them
    pub fn raw_hex(&self) -> String {
        hex::encode(&self.raw)
    }
}

/// Chain account collaborator: nonce source, chain head and signer
#[async_trait]
pub trait ChainAccount: Send + Sync {
    /// Current transaction count for the account (the next nonce)
    async fn transaction_count(&self) -> Result<u64>;

    /// Height of the latest produced slot
    async fn head_slot(&self) -> Result<u64>;

    /// Sign a transaction with the account's private credential
    fn sign(&self, tx: &Transaction) -> Result<SignedTransaction>;
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

/// JSON-RPC backed chain account
///
/// Nonce and chain head come from the node; signing happens locally
/// with the private credential and never leaves the process.
#[derive(Clone)]
pub struct RpcChainAccount {
    client: Client,
    rpc_url: String,
    address: String,
    private_key: String,
}

impl RpcChainAccount {
    pub fn new(rpc_url: String, address: String, private_key: String) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
            address,
            private_key,
        }
    }

    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(format!("rpc error {}: {}", err.code, err.message).into());
        }
        response
            .result
            .ok_or_else(|| format!("rpc response for {} had no result", method).into())
    }
}

#[async_trait]
impl ChainAccount for RpcChainAccount {
    async fn transaction_count(&self) -> Result<u64> {
        self.rpc_call("getTransactionCount", json!([self.address]))
            .await
    }

    async fn head_slot(&self) -> Result<u64> {
        self.rpc_call("getSlot", json!([])).await
    }

    fn sign(&self, tx: &Transaction) -> Result<SignedTransaction> {
        let raw = tx.encode()?;

        let mut mac = HmacSha256::new_from_slice(self.private_key.as_bytes())
            .map_err(|e| format!("invalid signing key: {}", e))?;
        mac.update(&raw);
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(SignedTransaction { raw, signature })
    }
}
