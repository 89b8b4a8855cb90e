use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

use crate::domain::RecencyToken;

/// Unsigned transaction contents for one submission.
///
/// Built from a fresh blockhash each time; a blockhash is only accepted by
/// the cluster until `last_valid_block_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEnvelope {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
    pub fee_payer: Pubkey,
    pub instructions: Vec<Instruction>,
}

impl TransactionEnvelope {
    pub fn new(recency: RecencyToken, fee_payer: Pubkey) -> Self {
        Self {
            blockhash: recency.blockhash,
            last_valid_block_height: recency.last_valid_block_height,
            fee_payer,
            instructions: Vec::new(),
        }
    }

    pub fn add(&mut self, instructions: impl IntoIterator<Item = Instruction>) -> &mut Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn message(&self) -> Message {
        Message::new_with_blockhash(&self.instructions, Some(&self.fee_payer), &self.blockhash)
    }

    pub fn into_unsigned_transaction(self) -> Transaction {
        Transaction::new_unsigned(self.message())
    }
}
