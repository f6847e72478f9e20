//! Anchor instruction encoding for the marketplace program.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;

/// First 8 bytes of `sha256("global:<name>")`, the Anchor instruction
/// selector.
pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let mut selector = [0u8; 8];
    selector.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    selector
}

/// Selector followed by the borsh-encoded arguments.
pub fn anchor_data<T: AnchorSerialize>(name: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = sighash(name).to_vec();
    args.serialize(&mut data)
        .map_err(|_| error!(anchor_lang::error::ErrorCode::InstructionDidNotSerialize))?;
    Ok(data)
}
