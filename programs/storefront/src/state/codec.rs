//! Borsh bodies of account data.
//!
//! Running out of bytes is reported as `TruncatedAccount`; any other
//! rejection (bad bool, option tag, enum variant or UTF-8) as
//! `MalformedAccount`.

use std::io::Read;

use anchor_lang::prelude::*;

use crate::errors::StorefrontError;

/// Slice reader that notes when a read found nothing left.
struct AccountBytes<'a> {
    data: &'a [u8],
    exhausted: bool,
}

impl Read for AccountBytes<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.data.is_empty() && !buf.is_empty() {
            self.exhausted = true;
        }
        self.data.read(buf)
    }
}

/// Deserialize `T` from the front of `data`. Trailing bytes are padding
/// or fields outside the model.
pub(crate) fn deserialize<T: AnchorDeserialize>(data: &[u8]) -> Result<T> {
    let mut bytes = AccountBytes {
        data,
        exhausted: false,
    };
    match T::deserialize_reader(&mut bytes) {
        Ok(value) => Ok(value),
        Err(_) if bytes.exhausted => err!(StorefrontError::TruncatedAccount),
        Err(e) => {
            msg!("Account data rejected: {}", e);
            err!(StorefrontError::MalformedAccount)
        }
    }
}

/// `prefix` followed by the borsh encoding of `value`.
pub(crate) fn serialize<T: AnchorSerialize>(prefix: &[u8], value: &T) -> Result<Vec<u8>> {
    let mut data = prefix.to_vec();
    value
        .serialize(&mut data)
        .map_err(|_| error!(anchor_lang::error::ErrorCode::AccountDidNotSerialize))?;
    Ok(data)
}
