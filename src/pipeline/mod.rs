// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signed Relay Pipeline
//!
//! One relay cycle for a wallet:
//!
//! 1. **Unlock**: decrypt the stored PIN with the server secret, then the
//!    account key with the PIN.
//! 2. **BuildTypedData**: send the call batch to the paymaster.
//! 3. **Sign**: hash and sign the typed data locally.
//! 4. **Execute**: submit the signature; the response must carry a
//!    transaction hash.
//!
//! Every step is terminal on failure and nothing is retried. Cycles run on a
//! spawned task tied to the request by a cancellation guard: when the caller
//! disconnects the step in flight still completes, but no further step is
//! started.

pub mod error;

use std::future::Future;

use chrono::Utc;
use starknet_core::types::Felt;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::blockchain::account::{counterfactual_address, DeploymentData};
use crate::blockchain::{
    build_calls, format_address, CallDescriptor, ChainClient, Operation, StarkSigner,
};
use crate::crypto::{
    decrypt_pin, decrypt_private_key, encrypt_pin, encrypt_private_key, CredentialError,
};
use crate::relay::{sign_typed_data, GasTokenOptions, PaymasterClient};
use crate::state::AppState;
use crate::store::WalletRecord;

pub use error::{PipelineError, Stage};

/// Outcome of a relay cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub transaction_hash: String,
    /// The account was deployed as part of this transaction.
    pub deployed_account: bool,
}

/// Outcome of the chained claim-then-swap flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimAndSwapOutcome {
    pub claim: RelayOutcome,
    pub swap: RelayOutcome,
}

/// Orchestrates relay cycles. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Pipeline {
    paymaster: PaymasterClient,
    chain: ChainClient,
    pin_secret: std::sync::Arc<str>,
    account_class_hash: Felt,
}

impl Pipeline {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            paymaster: state.paymaster.clone(),
            chain: state.chain.clone(),
            pin_secret: state.config.pin_encryption_secret.as_str().into(),
            account_class_hash: state.config.contracts.account_class_hash,
        }
    }

    /// Run one operation for a wallet.
    ///
    /// Undeployed accounts are deployed in the same transaction.
    pub async fn execute(
        &self,
        wallet: WalletRecord,
        operation: Operation,
        gas: GasTokenOptions,
    ) -> Result<RelayOutcome, PipelineError> {
        let pipeline = self.clone();
        run_guarded(move |cancel| async move {
            let signer = pipeline.unlock(&wallet, &cancel).await?;
            let deployment = pipeline.deployment_for(&wallet).await?;
            tracing::info!(
                wallet = %format_address(&wallet.address),
                operation = operation.name(),
                "Relaying operation"
            );
            pipeline
                .relay(&signer, &wallet, &build_calls(&operation), &gas, deployment, &cancel)
                .await
        })
        .await
    }

    /// Deploy the wallet's account without any other call.
    pub async fn deploy(
        &self,
        wallet: WalletRecord,
        gas: GasTokenOptions,
    ) -> Result<RelayOutcome, PipelineError> {
        let pipeline = self.clone();
        run_guarded(move |cancel| async move {
            let signer = pipeline.unlock(&wallet, &cancel).await?;
            let deployment =
                DeploymentData::for_account(wallet.public_key, pipeline.account_class_hash);
            pipeline
                .relay(&signer, &wallet, &[], &gas, Some(deployment), &cancel)
                .await
        })
        .await
    }

    /// Claim rewards, wait until the claim is final, then swap.
    pub async fn claim_and_swap(
        &self,
        wallet: WalletRecord,
        claim: Operation,
        swap: Operation,
        gas: GasTokenOptions,
    ) -> Result<ClaimAndSwapOutcome, PipelineError> {
        let pipeline = self.clone();
        run_guarded(move |cancel| async move {
            let signer = pipeline.unlock(&wallet, &cancel).await?;
            let deployment = pipeline.deployment_for(&wallet).await?;
            let wallet_address = format_address(&wallet.address);

            let claim = pipeline
                .relay(&signer, &wallet, &build_calls(&claim), &gas, deployment, &cancel)
                .await?;

            // The claim is on chain from here on; failures must carry it.
            match pipeline
                .swap_after_claim(&signer, &wallet, &claim, &swap, &gas, &cancel)
                .await
            {
                Ok(swap) => Ok(ClaimAndSwapOutcome { claim, swap }),
                Err(source) => {
                    tracing::error!(
                        wallet = %wallet_address,
                        claim_tx_hash = %claim.transaction_hash,
                        error = %source,
                        "Swap failed after claim was submitted"
                    );
                    Err(PipelineError::SwapFailed {
                        claim,
                        source: Box::new(source),
                    })
                }
            }
        })
        .await
    }

    async fn swap_after_claim(
        &self,
        signer: &StarkSigner,
        wallet: &WalletRecord,
        claim: &RelayOutcome,
        swap: &Operation,
        gas: &GasTokenOptions,
        cancel: &CancellationToken,
    ) -> Result<RelayOutcome, PipelineError> {
        checkpoint(cancel, Stage::AwaitFinality)?;
        tracing::info!(
            wallet = %format_address(&wallet.address),
            stage = %Stage::AwaitFinality,
            tx_hash = %claim.transaction_hash,
            "Waiting for claim to be final"
        );
        self.chain.wait_for_finality(&claim.transaction_hash).await?;

        self.relay(signer, wallet, &build_calls(swap), gas, None, cancel)
            .await
    }

    async fn unlock(
        &self,
        wallet: &WalletRecord,
        cancel: &CancellationToken,
    ) -> Result<StarkSigner, PipelineError> {
        checkpoint(cancel, Stage::Unlock)?;

        let encrypted_pin = wallet.encrypted_pin.clone();
        let encrypted_key = wallet.encrypted_private_key.clone();
        let secret = self.pin_secret.clone();

        let signer = tokio::task::spawn_blocking(move || {
            let pin = decrypt_pin(&encrypted_pin, &secret)?;
            let key = decrypt_private_key(&encrypted_key, &pin)?;
            StarkSigner::from_hex(&key).map_err(|_| CredentialError::Malformed)
        })
        .await
        .map_err(|e| PipelineError::TaskFailed(e.to_string()))?;

        signer.map_err(|e| {
            tracing::error!(
                wallet = %format_address(&wallet.address),
                stage = %Stage::Unlock,
                error = %e,
                "Failed to unlock credentials"
            );
            PipelineError::Credential(e)
        })
    }

    /// Attach deployment data if the account does not exist on chain yet.
    async fn deployment_for(
        &self,
        wallet: &WalletRecord,
    ) -> Result<Option<DeploymentData>, PipelineError> {
        if wallet.deployed || self.chain.is_deployed(&wallet.address).await? {
            return Ok(None);
        }
        Ok(Some(DeploymentData::for_account(
            wallet.public_key,
            self.account_class_hash,
        )))
    }

    async fn relay(
        &self,
        signer: &StarkSigner,
        wallet: &WalletRecord,
        calls: &[CallDescriptor],
        gas: &GasTokenOptions,
        deployment: Option<DeploymentData>,
        cancel: &CancellationToken,
    ) -> Result<RelayOutcome, PipelineError> {
        let wallet_address = format_address(&wallet.address);
        let class_hash = deployment.as_ref().map(|_| self.account_class_hash);

        checkpoint(cancel, Stage::BuildTypedData)?;
        tracing::debug!(
            wallet = %wallet_address,
            stage = %Stage::BuildTypedData,
            calls = calls.len()
        );
        let typed_data = self
            .paymaster
            .build_typed_data(&wallet.address, calls, class_hash.as_ref(), gas)
            .await
            .inspect_err(|e| log_failure(&wallet_address, Stage::BuildTypedData, e))?;

        checkpoint(cancel, Stage::Sign)?;
        let signature = sign_typed_data(signer, &typed_data, &wallet.address)
            .inspect_err(|e| log_failure(&wallet_address, Stage::Sign, e))?;

        checkpoint(cancel, Stage::Execute)?;
        tracing::debug!(wallet = %wallet_address, stage = %Stage::Execute);
        let transaction_hash = self
            .paymaster
            .execute(&wallet.address, &typed_data, &signature, deployment.as_ref())
            .await
            .inspect_err(|e| log_failure(&wallet_address, Stage::Execute, e))?;

        tracing::info!(
            wallet = %wallet_address,
            tx_hash = %transaction_hash,
            deployed_account = deployment.is_some(),
            "Transaction submitted"
        );

        Ok(RelayOutcome {
            transaction_hash,
            deployed_account: deployment.is_some(),
        })
    }
}

fn log_failure(wallet: &str, stage: Stage, error: &dyn std::fmt::Display) {
    tracing::error!(wallet, stage = %stage, error = %error, "Relay cycle failed");
}

fn checkpoint(cancel: &CancellationToken, next: Stage) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        tracing::warn!(stage = %next, "Caller went away, not starting next stage");
        return Err(PipelineError::Cancelled(next));
    }
    Ok(())
}

/// Run `job` on its own task. The token handed to the job is cancelled when
/// the returned future is dropped.
async fn run_guarded<F, Fut, T>(job: F) -> Result<T, PipelineError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();

    tokio::spawn(job(token))
        .await
        .map_err(|e| PipelineError::TaskFailed(e.to_string()))?
}

/// Provision a new wallet: fresh key, counterfactual address, encrypted
/// secrets. CPU-heavy (two Argon2 derivations); run off the async runtime.
pub fn provision_wallet(
    pin: &str,
    server_secret: &str,
    account_class_hash: Felt,
) -> Result<WalletRecord, CredentialError> {
    let signer = StarkSigner::generate().map_err(|_| CredentialError::Encryption)?;
    let public_key = signer.public_key();
    let secret = Zeroizing::new(signer.secret_hex());

    Ok(WalletRecord {
        address: counterfactual_address(public_key, account_class_hash),
        public_key,
        encrypted_private_key: encrypt_private_key(&secret, pin)?,
        encrypted_pin: encrypt_pin(pin, server_secret)?,
        deployed: false,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{felt_to_hex, ChainError, FixedPointPair};
    use crate::relay::client::tests::sample_typed_data;
    use crate::relay::RelayError;
    use crate::state::tests::test_state;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUILD_PATH: &str = "/paymaster/v1/build-typed-data";
    const EXECUTE_PATH: &str = "/paymaster/v1/execute";

    struct Harness {
        relay: MockServer,
        rpc: MockServer,
        state: AppState,
    }

    async fn harness() -> Harness {
        let relay = MockServer::start().await;
        let rpc = MockServer::start().await;
        let state = test_state(&relay.uri(), &rpc.uri(), "http://127.0.0.1:9");
        Harness { relay, rpc, state }
    }

    fn wallet(state: &AppState, deployed: bool) -> WalletRecord {
        let mut record = provision_wallet(
            "1234",
            &state.config.pin_encryption_secret,
            state.config.contracts.account_class_hash,
        )
        .unwrap();
        record.deployed = deployed;
        record
    }

    fn transfer() -> Operation {
        Operation::Transfer {
            token: Felt::from(0x10u64),
            recipient: Felt::from(0x20u64),
            amount: FixedPointPair { low: 7, high: 0 },
        }
    }

    async fn mock_build(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(BUILD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_typed_data()))
            .mount(server)
            .await;
    }

    async fn mock_execute(server: &MockServer, response: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path(EXECUTE_PATH))
            .respond_with(response)
            .expect(times)
            .mount(server)
            .await;
    }

    #[test]
    fn provisioned_wallet_unlocks_with_its_pin() {
        let record = provision_wallet("9876", "server-secret", Felt::from(0x1234u64)).unwrap();
        let pin = decrypt_pin(&record.encrypted_pin, "server-secret").unwrap();
        assert_eq!(pin.as_str(), "9876");

        let key = decrypt_private_key(&record.encrypted_private_key, &pin).unwrap();
        let signer = StarkSigner::from_hex(&key).unwrap();
        assert_eq!(signer.public_key(), record.public_key);
        assert_eq!(
            record.address,
            counterfactual_address(record.public_key, Felt::from(0x1234u64))
        );
        assert!(!record.deployed);
    }

    #[tokio::test]
    async fn relays_operation_for_deployed_wallet() {
        let h = harness().await;
        mock_build(&h.relay).await;
        mock_execute(
            &h.relay,
            ResponseTemplate::new(200).set_body_json(json!({"transactionHash": "0xabc"})),
            1,
        )
        .await;

        let outcome = Pipeline::from_state(&h.state)
            .execute(wallet(&h.state, true), transfer(), GasTokenOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.transaction_hash, "0xabc");
        assert!(!outcome.deployed_account);
        assert!(h.rpc.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn undeployed_wallet_is_deployed_in_same_transaction() {
        let h = harness().await;
        let class_hash = felt_to_hex(&h.state.config.contracts.account_class_hash);

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "starknet_getClassHashAt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": 20, "message": "Contract not found"}
            })))
            .mount(&h.rpc)
            .await;
        Mock::given(method("POST"))
            .and(path(BUILD_PATH))
            .and(body_partial_json(json!({"accountClassHash": class_hash})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_typed_data()))
            .expect(1)
            .mount(&h.relay)
            .await;
        Mock::given(method("POST"))
            .and(path(EXECUTE_PATH))
            .and(body_partial_json(json!({"deploymentData": {"class_hash": class_hash}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"transactionHash": "0xdef"})),
            )
            .expect(1)
            .mount(&h.relay)
            .await;

        let outcome = Pipeline::from_state(&h.state)
            .execute(wallet(&h.state, false), transfer(), GasTokenOptions::default())
            .await
            .unwrap();
        assert!(outcome.deployed_account);
    }

    #[tokio::test]
    async fn execute_failure_is_terminal() {
        let h = harness().await;
        mock_build(&h.relay).await;
        mock_execute(
            &h.relay,
            ResponseTemplate::new(500).set_body_json(json!({"message": "paymaster down"})),
            1,
        )
        .await;

        let err = Pipeline::from_state(&h.state)
            .execute(wallet(&h.state, true), transfer(), GasTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Relay(RelayError::UpstreamExecute(ref m)) if m.contains("paymaster down")
        ));
    }

    #[tokio::test]
    async fn missing_transaction_hash_fails() {
        let h = harness().await;
        mock_build(&h.relay).await;
        mock_execute(
            &h.relay,
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})),
            1,
        )
        .await;

        let err = Pipeline::from_state(&h.state)
            .execute(wallet(&h.state, true), transfer(), GasTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Relay(RelayError::MissingHash)));
    }

    #[tokio::test]
    async fn build_failure_never_executes() {
        let h = harness().await;
        Mock::given(method("POST"))
            .and(path(BUILD_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad calls"})))
            .mount(&h.relay)
            .await;
        mock_execute(&h.relay, ResponseTemplate::new(200), 0).await;

        let err = Pipeline::from_state(&h.state)
            .execute(wallet(&h.state, true), transfer(), GasTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Relay(RelayError::UpstreamBuild(_))));
    }

    #[tokio::test]
    async fn wrong_server_secret_fails_at_unlock() {
        let h = harness().await;
        mock_execute(&h.relay, ResponseTemplate::new(200), 0).await;

        let mut record = wallet(&h.state, true);
        record.encrypted_pin = encrypt_pin("1234", "another-secret").unwrap();

        let err = Pipeline::from_state(&h.state)
            .execute(record, transfer(), GasTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Credential(_)));
    }

    #[tokio::test]
    async fn claim_and_swap_waits_for_claim() {
        let h = harness().await;
        mock_build(&h.relay).await;
        mock_execute(
            &h.relay,
            ResponseTemplate::new(200).set_body_json(json!({"transactionHash": "0x77"})),
            2,
        )
        .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "starknet_getTransactionReceipt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {"finality_status": "ACCEPTED_ON_L2", "execution_status": "SUCCEEDED"}
            })))
            .expect(1..)
            .mount(&h.rpc)
            .await;

        let claim = Operation::Claim {
            distributor: Felt::from(0x30u64),
            amount: FixedPointPair { low: 9, high: 0 },
            proof: vec![],
        };
        let swap = Operation::Swap {
            router: Felt::from(0x40u64),
            sell_token: Felt::from(0x50u64),
            buy_token: Felt::from(0x60u64),
            amount: FixedPointPair { low: 9, high: 0 },
            min_amount_out: FixedPointPair { low: 0, high: 0 },
            recipient: Felt::from(0x70u64),
        };

        let outcome = Pipeline::from_state(&h.state)
            .claim_and_swap(wallet(&h.state, true), claim, swap, GasTokenOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.claim.transaction_hash, "0x77");
        assert_eq!(outcome.swap.transaction_hash, "0x77");
    }

    #[tokio::test]
    async fn reverted_claim_skips_swap() {
        let h = harness().await;
        mock_build(&h.relay).await;
        mock_execute(
            &h.relay,
            ResponseTemplate::new(200).set_body_json(json!({"transactionHash": "0x78"})),
            1,
        )
        .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "starknet_getTransactionReceipt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "finality_status": "ACCEPTED_ON_L2",
                    "execution_status": "REVERTED",
                    "revert_reason": "nothing to claim"
                }
            })))
            .mount(&h.rpc)
            .await;

        let claim = Operation::Claim {
            distributor: Felt::from(0x30u64),
            amount: FixedPointPair { low: 9, high: 0 },
            proof: vec![],
        };
        let err = Pipeline::from_state(&h.state)
            .claim_and_swap(wallet(&h.state, true), claim, transfer(), GasTokenOptions::default())
            .await
            .unwrap_err();
        let PipelineError::SwapFailed { claim, source } = err else {
            panic!("expected swap failure");
        };
        assert_eq!(claim.transaction_hash, "0x78");
        assert!(matches!(*source, PipelineError::Chain(ChainError::Reverted { .. })));
    }

    #[tokio::test]
    async fn swap_failure_keeps_claim_outcome() {
        let h = harness().await;
        Mock::given(method("POST"))
            .and(path(BUILD_PATH))
            .and(body_partial_json(json!({"calls": [{"entrypoint": "claim"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_typed_data()))
            .expect(1)
            .mount(&h.relay)
            .await;
        Mock::given(method("POST"))
            .and(path(BUILD_PATH))
            .and(body_partial_json(json!({"calls": [{"entrypoint": "transfer"}]})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "no liquidity"})))
            .expect(1)
            .mount(&h.relay)
            .await;
        mock_execute(
            &h.relay,
            ResponseTemplate::new(200).set_body_json(json!({"transactionHash": "0x79"})),
            1,
        )
        .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "starknet_getTransactionReceipt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {"finality_status": "ACCEPTED_ON_L2", "execution_status": "SUCCEEDED"}
            })))
            .mount(&h.rpc)
            .await;

        let claim = Operation::Claim {
            distributor: Felt::from(0x30u64),
            amount: FixedPointPair { low: 9, high: 0 },
            proof: vec![],
        };
        let err = Pipeline::from_state(&h.state)
            .claim_and_swap(wallet(&h.state, true), claim, transfer(), GasTokenOptions::default())
            .await
            .unwrap_err();

        let PipelineError::SwapFailed { claim, source } = err else {
            panic!("expected swap failure");
        };
        assert_eq!(claim.transaction_hash, "0x79");
        assert!(!claim.deployed_account);
        assert!(matches!(*source, PipelineError::Relay(RelayError::UpstreamBuild(_))));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_next_stage() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            checkpoint(&token, Stage::Execute),
            Err(PipelineError::Cancelled(Stage::Execute))
        ));
    }

    #[tokio::test]
    async fn dropping_caller_cancels_job() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let caller = tokio::spawn(run_guarded(move |cancel| async move {
            let _ = tx.send(cancel.clone());
            cancel.cancelled().await;
            Ok::<_, PipelineError>(())
        }));

        let token = rx.await.unwrap();
        assert!(!token.is_cancelled());
        caller.abort();
        tokio::time::timeout(std::time::Duration::from_secs(2), token.cancelled())
            .await
            .unwrap();
    }
}
