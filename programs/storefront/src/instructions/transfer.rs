use anchor_lang::prelude::*;
use anchor_spl::associated_token::spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use anchor_spl::token::spl_token;
use solana_sdk::instruction::Instruction;

use crate::constants::TOKEN_PROGRAM_ID;
use crate::errors::StorefrontError;
use crate::pda::associated_token_address;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferParams {
    pub mint: Pubkey,
    pub recipient: Pubkey,
}

/// Move one NFT from `owner` to the recipient's associated token account,
/// creating that account if needed.
pub fn transfer(owner: &Pubkey, params: &TransferParams) -> Result<Vec<Instruction>> {
    require!(params.recipient != *owner, StorefrontError::InvalidRecipient);

    let source = associated_token_address(owner, &params.mint)?;
    let destination = associated_token_address(&params.recipient, &params.mint)?;

    Ok(vec![
        create_associated_token_account_idempotent(
            owner,
            &params.recipient,
            &params.mint,
            &TOKEN_PROGRAM_ID,
        ),
        spl_token::instruction::transfer(&TOKEN_PROGRAM_ID, &source, &destination, owner, &[], 1)?,
    ])
}
