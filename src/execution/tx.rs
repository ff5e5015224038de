use serde::{Deserialize, Serialize};

use crate::models::{GridOrder, OrderSide};

/// Supported venue calls, one variant per call
///
/// The call a transaction performs is fixed at build time by the
/// variant, never resolved by name at call time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TransactionCall {
    PlaceOrder {
        side: OrderSide,
        price: f64,
        lot: f64,
    },
    PlaceGridOrders {
        orders: Vec<GridOrder>,
    },
}

/// Fixed gas policy applied to every transaction
#[derive(Debug, Clone, Copy)]
pub struct GasPolicy {
    pub gas_price: u64,
    pub gas_limit: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            gas_price: 20_000_000_000, // 20 gwei
            gas_limit: 2_000_000,
        }
    }
}

/// An unsigned transaction addressed at the trading venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub call: TransactionCall,
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
}

impl Transaction {
    pub fn new(call: TransactionCall, nonce: u64, gas: GasPolicy) -> Self {
        Self {
            call,
            nonce,
            gas_price: gas.gas_price,
            gas_limit: gas.gas_limit,
        }
    }

    /// Canonical byte encoding used for signing and relay payloads
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
