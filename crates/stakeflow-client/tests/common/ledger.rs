//! In-memory ledger implementing `LedgerRpc`.
//!
//! Accounts live in a map. Submissions are recorded and answered from a
//! script, and transactions addressed to the lookup-table program are applied
//! so the lookup-table manager can run end to end.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::program::ID as LOOKUP_TABLE_PROGRAM_ID;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use stakeflow_client::classify::error_from_text;
use stakeflow_client::{ClientError, LedgerRpc, SignatureState};

use super::mock_accounts::{append_lookup_table_addresses, lookup_table_account};

/// How the ledger answers one `send_transaction` call.
#[derive(Clone, Debug)]
pub enum SendBehavior {
    /// Accept; status follows the default status
    Accept,
    /// Accept, then report this execution error on status checks
    FailOnLedger(String),
    /// Reject at submission with this error text
    Reject(String),
    /// Report "already processed" including the signature
    DuplicateWithSignature,
    /// Report "already processed" without any signature
    DuplicateWithoutSignature,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    sent: Vec<VersionedTransaction>,
    send_script: VecDeque<SendBehavior>,
    program_script: Option<(Pubkey, VecDeque<SendBehavior>)>,
    statuses: HashMap<Signature, SignatureState>,
    default_status: Option<SignatureState>,
    status_calls: usize,
    fail_multiple_accounts: bool,
}

/// In-memory ledger.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.state.lock().unwrap().accounts.insert(address, account);
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.state.lock().unwrap().accounts.get(address).cloned()
    }

    pub fn remove_account(&self, address: &Pubkey) {
        self.state.lock().unwrap().accounts.remove(address);
    }

    /// Queue answers for the next submissions, in order.
    pub fn script_sends(&self, behaviors: impl IntoIterator<Item = SendBehavior>) {
        self.state.lock().unwrap().send_script.extend(behaviors);
    }

    /// Queue answers for the next submissions touching `program_id` only.
    ///
    /// Other transactions (lookup-table maintenance) keep using the general
    /// script.
    pub fn script_program_sends(
        &self,
        program_id: Pubkey,
        behaviors: impl IntoIterator<Item = SendBehavior>,
    ) {
        self.state.lock().unwrap().program_script =
            Some((program_id, behaviors.into_iter().collect()));
    }

    /// Status reported for accepted signatures without a specific status.
    pub fn set_default_status(&self, status: SignatureState) {
        self.state.lock().unwrap().default_status = Some(status);
    }

    /// Make `get_multiple_accounts` fail with a transport error.
    pub fn fail_multiple_accounts(&self, fail: bool) {
        self.state.lock().unwrap().fail_multiple_accounts = fail;
    }

    /// Every transaction handed to `send_transaction`, including rejected ones.
    pub fn sent(&self) -> Vec<VersionedTransaction> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Transactions not addressed to the lookup-table program.
    pub fn sent_excluding_lookup_tables(&self) -> Vec<VersionedTransaction> {
        self.sent()
            .into_iter()
            .filter(|tx| !touches_program(tx, &LOOKUP_TABLE_PROGRAM_ID))
            .collect()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }
}

/// Whether any instruction of `tx` targets `program_id`.
pub fn touches_program(tx: &VersionedTransaction, program_id: &Pubkey) -> bool {
    count_program_instructions(tx, program_id) > 0
}

/// Instructions of `tx` whose program is `program_id`.
pub fn count_program_instructions(tx: &VersionedTransaction, program_id: &Pubkey) -> usize {
    program_instruction_data(tx, program_id).len()
}

/// Data of each instruction of `tx` whose program is `program_id`.
pub fn program_instruction_data(tx: &VersionedTransaction, program_id: &Pubkey) -> Vec<Vec<u8>> {
    let keys = tx.message.static_account_keys();
    tx.message
        .instructions()
        .iter()
        .filter(|ix| keys.get(usize::from(ix.program_id_index)) == Some(program_id))
        .map(|ix| ix.data.clone())
        .collect()
}

fn apply_lookup_table_instructions(state: &mut LedgerState, tx: &VersionedTransaction) {
    let keys = tx.message.static_account_keys().to_vec();
    for ix in tx.message.instructions() {
        if keys.get(usize::from(ix.program_id_index)) != Some(&LOOKUP_TABLE_PROGRAM_ID) {
            continue;
        }
        let table = keys[usize::from(ix.accounts[0])];
        let authority = keys[usize::from(ix.accounts[1])];
        let tag = u32::from_le_bytes(ix.data[0..4].try_into().unwrap());
        match tag {
            // CreateLookupTable
            0 => {
                state
                    .accounts
                    .insert(table, lookup_table_account(&authority, &[]));
            }
            // ExtendLookupTable: u64 length then addresses
            2 => {
                let len = u64::from_le_bytes(ix.data[4..12].try_into().unwrap()) as usize;
                let addresses: Vec<Pubkey> = (0..len)
                    .map(|i| {
                        let start = 12 + i * 32;
                        Pubkey::new_from_array(ix.data[start..start + 32].try_into().unwrap())
                    })
                    .collect();
                let account = state.accounts.get_mut(&table).expect("extend of unknown table");
                append_lookup_table_addresses(account, &addresses);
            }
            other => panic!("unexpected lookup table instruction {other}"),
        }
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, ClientError> {
        Ok(self.account(address))
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Account>>, ClientError> {
        let state = self.state.lock().unwrap();
        if state.fail_multiple_accounts {
            return Err(ClientError::Rpc("connection reset".into()));
        }
        Ok(addresses
            .iter()
            .map(|a| state.accounts.get(a).cloned())
            .collect())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(Hash::new_unique())
    }

    async fn get_slot(&self) -> Result<u64, ClientError> {
        Ok(1_000)
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError> {
        let mut state = self.state.lock().unwrap();
        let signature = transaction.signatures[0];
        state.sent.push(transaction.clone());
        let scripted = match &mut state.program_script {
            Some((program_id, script)) if touches_program(transaction, program_id) => {
                Some(script.pop_front())
            }
            _ => None,
        };
        let behavior = match scripted {
            Some(behavior) => behavior,
            None => state.send_script.pop_front(),
        }
        .unwrap_or(SendBehavior::Accept);
        match behavior {
            SendBehavior::Accept => {
                apply_lookup_table_instructions(&mut state, transaction);
                Ok(signature)
            }
            SendBehavior::FailOnLedger(message) => {
                state
                    .statuses
                    .insert(signature, SignatureState::Failed(message));
                Ok(signature)
            }
            SendBehavior::Reject(text) => Err(error_from_text(text)),
            SendBehavior::DuplicateWithSignature => Err(ClientError::DuplicateSubmission(format!(
                "Transaction simulation failed: This transaction has already been processed: {signature}"
            ))),
            SendBehavior::DuplicateWithoutSignature => Err(ClientError::DuplicateSubmission(
                "Transaction simulation failed: This transaction has already been processed"
                    .to_string(),
            )),
        }
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureState, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        Ok(state
            .statuses
            .get(signature)
            .cloned()
            .or_else(|| state.default_status.clone())
            .unwrap_or(SignatureState::Confirmed))
    }
}
