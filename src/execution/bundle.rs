use serde::Serialize;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::error::RelayError;
use crate::execution::account::ChainAccount;
use crate::execution::relay::{BundlePayload, BundleRelay, InclusionStatus};
use crate::execution::tx::{GasPolicy, Transaction, TransactionCall};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Terminal outcome of a bundle submission
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum BundleResult {
    Included { slot: u64 },
    Failed { attempts_exhausted: u32 },
}

/// One submission attempt
///
/// Attempt k targets `initial_slot + k` and carries a fresh
/// idempotency token; the signed transaction is shared by all attempts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionAttempt {
    pub target_slot: u64,
    pub attempt: u32,
    pub idempotency_token: String,
}

/// Machine states, kept explicit so the attempt bound and the
/// slot-advancement rule stay directly testable
#[derive(Debug)]
enum SubmissionState {
    Submitting { attempt: u32, target_slot: u64 },
    Included { slot: u64 },
    Failed { attempts: u32 },
}

/// Drives a transaction toward inclusion in a target execution slot
///
/// Builds and signs the transaction once, then submits the bundle to
/// the private relay addressed at `head_slot + 1`, waiting for the
/// relay's verdict each time. A missed slot or a transient fault
/// advances the target slot by one and retries with a fresh
/// idempotency token, up to `max_retries` attempts.
pub struct BundleExecutor<R, A> {
    relay: R,
    account: A,
    gas_policy: GasPolicy,
    max_retries: u32,
    retry_delay: Duration,
}

impl<R: BundleRelay, A: ChainAccount> BundleExecutor<R, A> {
    pub fn new(relay: R, account: A) -> Self {
        Self {
            relay,
            account,
            gas_policy: GasPolicy::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Build, sign and submit a transaction bundle, retrying against
    /// advancing target slots until included or exhausted
    pub async fn execute(&self, call: TransactionCall) -> crate::Result<BundleResult> {
        // Built: the live nonce and the gas policy fix the transaction
        let Some(nonce) = self.fetch_nonce().await else {
            return Ok(BundleResult::Failed {
                attempts_exhausted: self.max_retries,
            });
        };
        let tx = Transaction::new(call, nonce, self.gas_policy);

        // Signed once: retries re-target a later slot, never a new transaction
        let signed = self.account.sign(&tx)?;
        let payload = BundlePayload::single(&signed);

        let Some(head) = self.fetch_head_slot().await else {
            return Ok(BundleResult::Failed {
                attempts_exhausted: self.max_retries,
            });
        };

        let mut state = SubmissionState::Submitting {
            attempt: 0,
            target_slot: head + 1,
        };

        loop {
            match state {
                SubmissionState::Submitting {
                    attempt,
                    target_slot,
                } => {
                    let record = SubmissionAttempt {
                        target_slot,
                        attempt,
                        idempotency_token: Uuid::new_v4().to_string(),
                    };
                    tracing::info!(
                        "submitting bundle: target slot {}, attempt {}/{}",
                        record.target_slot,
                        record.attempt + 1,
                        self.max_retries
                    );

                    state = match self.submit_once(&payload, &record).await {
                        Ok(InclusionStatus::Included { slot, receipt }) => {
                            tracing::info!("bundle included in slot {} ({})", slot, receipt);
                            SubmissionState::Included { slot }
                        }
                        Ok(InclusionStatus::NotIncluded) => {
                            tracing::warn!("bundle not included by slot {}", target_slot);
                            self.next_attempt(attempt, target_slot).await
                        }
                        Err(e) if e.is_transient() => {
                            // Transient faults count as a failed attempt
                            tracing::error!("bundle submission error: {}", e);
                            self.next_attempt(attempt, target_slot).await
                        }
                        Err(e) => return Err(e.into()),
                    };
                }
                SubmissionState::Included { slot } => {
                    return Ok(BundleResult::Included { slot });
                }
                SubmissionState::Failed { attempts } => {
                    tracing::error!("bundle submission failed after {} attempts", attempts);
                    return Ok(BundleResult::Failed {
                        attempts_exhausted: attempts,
                    });
                }
            }
        }
    }

    /// Submit one attempt and wait for the relay's verdict
    ///
    /// A relay-side "not found" is ordinary non-inclusion, not an error.
    /// The await is the only suspension point in a pipeline run.
    async fn submit_once(
        &self,
        payload: &BundlePayload,
        attempt: &SubmissionAttempt,
    ) -> std::result::Result<InclusionStatus, RelayError> {
        let ticket = match self
            .relay
            .submit(payload, attempt.target_slot, &attempt.idempotency_token)
            .await
        {
            Ok(ticket) => ticket,
            Err(RelayError::NotFound) => return Ok(InclusionStatus::NotIncluded),
            Err(e) => return Err(e),
        };

        match self.relay.await_inclusion(&ticket).await {
            Ok(status) => Ok(status),
            Err(RelayError::NotFound) => Ok(InclusionStatus::NotIncluded),
            Err(e) => Err(e),
        }
    }

    async fn next_attempt(&self, attempt: u32, target_slot: u64) -> SubmissionState {
        let next = attempt + 1;
        if next >= self.max_retries {
            return SubmissionState::Failed { attempts: next };
        }
        sleep(self.retry_delay).await;
        SubmissionState::Submitting {
            attempt: next,
            target_slot: target_slot + 1,
        }
    }

    async fn fetch_nonce(&self) -> Option<u64> {
        for attempt in 1..=self.max_retries {
            match self.account.transaction_count().await {
                Ok(value) => return Some(value),
                Err(e) => {
                    tracing::warn!(
                        "transaction count fetch failed (attempt {}/{}): {}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    if attempt < self.max_retries {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }
        None
    }

    async fn fetch_head_slot(&self) -> Option<u64> {
        for attempt in 1..=self.max_retries {
            match self.account.head_slot().await {
                Ok(value) => return Some(value),
                Err(e) => {
                    tracing::warn!(
                        "chain head fetch failed (attempt {}/{}): {}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    if attempt < self.max_retries {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::account::SignedTransaction;
    use crate::execution::relay::BundleTicket;
    use crate::models::OrderSide;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubAccount {
        reachable: bool,
    }

    #[async_trait]
    impl ChainAccount for StubAccount {
        async fn transaction_count(&self) -> crate::Result<u64> {
            if self.reachable {
                Ok(7)
            } else {
                Err("connection refused".into())
            }
        }

        async fn head_slot(&self) -> crate::Result<u64> {
            if self.reachable {
                Ok(100)
            } else {
                Err("connection refused".into())
            }
        }

        fn sign(&self, tx: &Transaction) -> crate::Result<SignedTransaction> {
            Ok(SignedTransaction {
                raw: tx.encode()?,
                signature: "stub-signature".to_string(),
            })
        }
    }

    /// Relay stub that records submissions and includes the bundle on a
    /// chosen submission index (0-based), or never
    struct StubRelay {
        include_on: Option<u32>,
        submissions: Mutex<Vec<(u64, String)>>,
    }

    impl StubRelay {
        fn new(include_on: Option<u32>) -> Self {
            Self {
                include_on,
                submissions: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<(u64, String)> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BundleRelay for StubRelay {
        async fn submit(
            &self,
            _payload: &BundlePayload,
            target_slot: u64,
            idempotency_token: &str,
        ) -> std::result::Result<BundleTicket, RelayError> {
            let mut submissions = self.submissions.lock().unwrap();
            let index = submissions.len() as u32;
            submissions.push((target_slot, idempotency_token.to_string()));

            Ok(BundleTicket {
                bundle_id: index.to_string(),
                target_slot,
            })
        }

        async fn await_inclusion(
            &self,
            ticket: &BundleTicket,
        ) -> std::result::Result<InclusionStatus, RelayError> {
            let index: u32 = ticket.bundle_id.parse().unwrap();
            if self.include_on == Some(index) {
                Ok(InclusionStatus::Included {
                    slot: ticket.target_slot,
                    receipt: "0xreceipt".to_string(),
                })
            } else {
                Ok(InclusionStatus::NotIncluded)
            }
        }
    }

    fn order_call() -> TransactionCall {
        TransactionCall::PlaceOrder {
            side: OrderSide::Buy,
            price: 100.0,
            lot: 1.0,
        }
    }

    fn executor(relay: StubRelay) -> BundleExecutor<StubRelay, StubAccount> {
        BundleExecutor::new(relay, StubAccount { reachable: true })
            .with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_never_included_exhausts_retries_with_advancing_slots() {
        let executor = executor(StubRelay::new(None));

        let result = executor.execute(order_call()).await.unwrap();
        assert_eq!(
            result,
            BundleResult::Failed {
                attempts_exhausted: 3
            }
        );

        // Attempt k targets initial_slot + k; head is 100 so initial is 101
        let submissions = executor.relay.recorded();
        let slots: Vec<u64> = submissions.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, vec![101, 102, 103]);

        // Each retry carries a fresh idempotency token
        let tokens: Vec<&String> = submissions.iter().map(|(_, token)| token).collect();
        assert_ne!(tokens[0], tokens[1]);
        assert_ne!(tokens[1], tokens[2]);
    }

    #[tokio::test]
    async fn test_inclusion_on_second_attempt_stops_retrying() {
        let executor = executor(StubRelay::new(Some(1)));

        let result = executor.execute(order_call()).await.unwrap();
        assert_eq!(result, BundleResult::Included { slot: 102 });

        // No third submission after success
        assert_eq!(executor.relay.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_inclusion_on_first_attempt() {
        let executor = executor(StubRelay::new(Some(0)));

        let result = executor.execute(order_call()).await.unwrap();
        assert_eq!(result, BundleResult::Included { slot: 101 });
        assert_eq!(executor.relay.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_account_fails_without_submitting() {
        let executor = BundleExecutor::new(StubRelay::new(Some(0)), StubAccount { reachable: false })
            .with_retry_delay(Duration::from_millis(1));

        let result = executor.execute(order_call()).await.unwrap();
        assert_eq!(
            result,
            BundleResult::Failed {
                attempts_exhausted: 3
            }
        );
        assert!(executor.relay.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_custom_retry_bound() {
        let executor = BundleExecutor::new(StubRelay::new(None), StubAccount { reachable: true })
            .with_max_retries(5)
            .with_retry_delay(Duration::from_millis(1));

        let result = executor.execute(order_call()).await.unwrap();
        assert_eq!(
            result,
            BundleResult::Failed {
                attempts_exhausted: 5
            }
        );
        assert_eq!(executor.relay.recorded().len(), 5);
    }
}
