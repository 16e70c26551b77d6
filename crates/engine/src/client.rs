//! Async seam to the system under test.
//!
//! The simulator never talks to a network directly; everything goes through
//! [`TargetClient`]. Production binds this to real RPC plumbing, tests bind
//! it to a scripted double.

use async_trait::async_trait;
use stampede_types::{Actor, ActorId, CallParams, ErrorKind};

/// Why a dry run predicts the call would fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedFailure {
    /// The actor cannot cover the transfer or its fees.
    InsufficientResources,
    /// A contract-level assertion would reject the call.
    ContractRejection,
    /// The call would exceed a resource or execution-unit limit.
    ResourceLimitExceeded,
    /// The target reported failure without a recognizable reason.
    Unknown,
}

impl PredictedFailure {
    /// Taxonomy bucket for result records and retry classification.
    pub fn error_kind(self) -> ErrorKind {
        match self {
            PredictedFailure::InsufficientResources => ErrorKind::InsufficientResources,
            PredictedFailure::ContractRejection => ErrorKind::PredictedRejection,
            PredictedFailure::ResourceLimitExceeded => ErrorKind::CostEstimation,
            PredictedFailure::Unknown => ErrorKind::Unknown,
        }
    }
}

impl std::fmt::Display for PredictedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PredictedFailure::InsufficientResources => "insufficient resources",
            PredictedFailure::ContractRejection => "contract rejection",
            PredictedFailure::ResourceLimitExceeded => "resource limit exceeded",
            PredictedFailure::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Outcome of a read-only pre-flight call. No cost is incurred either way.
#[derive(Debug, Clone)]
pub enum DryRunOutcome {
    /// The call is predicted to succeed.
    Ok,
    /// The call is predicted to fail; nothing should be submitted.
    WouldFail {
        reason: PredictedFailure,
        detail: String,
    },
}

/// Everything the target needs to execute one submitted call.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub actor: ActorId,
    /// Submitting address; the client signs on its behalf.
    pub address: String,
    pub params: CallParams,
    /// Sequence value assigned by the coordinator for this attempt.
    pub sequence: u64,
}

/// Opaque reference to an in-flight submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitHandle(pub String);

/// What the target reports once a submitted call settles.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// Whether the call executed successfully on the target.
    pub success: bool,
    pub settlement_id: String,
    pub block_reference: Option<u64>,
    /// Failure detail from the target, absent on success.
    pub error: Option<String>,
    /// The client's taxonomy classification of a settlement failure.
    pub error_kind: Option<ErrorKind>,
    /// Cost units actually charged. Nonzero even for failed executions that
    /// consumed resources.
    pub cost_used: f64,
}

/// Transport and target-side failures, pre-classified by the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("sequence value rejected by target: {0}")]
    SequenceMismatch(String),
    #[error("transient network failure: {0}")]
    Transient(String),
    #[error("call rejected as malformed: {0}")]
    Validation(String),
    #[error("cost estimation failed: {0}")]
    CostEstimation(String),
    #[error("target client failure: {0}")]
    Other(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::SequenceMismatch(_) => ErrorKind::Sequence,
            ClientError::Transient(_) => ErrorKind::TransientNetwork,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::CostEstimation(_) => ErrorKind::CostEstimation,
            ClientError::Other(_) => ErrorKind::Unknown,
        }
    }
}

/// Client for the contract under test.
///
/// Implementations must be safe to share across actor tasks; the
/// orchestrator calls them concurrently.
#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Read-only pre-flight predicting whether the call would succeed.
    async fn dry_run(&self, actor: &Actor, params: &CallParams)
        -> Result<DryRunOutcome, ClientError>;

    /// Estimate the call's cost in execution units, before any margin.
    async fn estimate_cost(&self, params: &CallParams) -> Result<f64, ClientError>;

    /// Submit the call for execution.
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitHandle, ClientError>;

    /// Wait for a submitted call to settle.
    async fn await_settlement(&self, handle: SubmitHandle) -> Result<Settlement, ClientError>;
}
