// Transaction construction and bundle submission module
pub mod account;
pub mod bundle;
pub mod relay;
pub mod tx;

pub use account::{ChainAccount, RpcChainAccount, SignedTransaction};
pub use bundle::{BundleExecutor, BundleResult, SubmissionAttempt};
pub use relay::{BundlePayload, BundleRelay, BundleTicket, HttpBundleRelay, InclusionStatus};
pub use tx::{GasPolicy, Transaction, TransactionCall};
