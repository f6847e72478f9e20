//! Listing lifecycle: `Active -> Sold` on buy, `Active -> Cancelled` on
//! cancel. Sold and Cancelled are terminal. The marketplace program
//! applies the same rules on-chain.

use anchor_lang::prelude::*;

use crate::errors::StorefrontError;
use crate::state::ListingStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingAction {
    Buy,
    Cancel,
}

impl ListingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ListingStatus::Sold | ListingStatus::Cancelled)
    }

    /// State reached by applying `action`, or `IllegalTransition`.
    pub fn transition(self, action: ListingAction) -> Result<ListingStatus> {
        match (self, action) {
            (ListingStatus::Active, ListingAction::Buy) => Ok(ListingStatus::Sold),
            (ListingStatus::Active, ListingAction::Cancel) => Ok(ListingStatus::Cancelled),
            (ListingStatus::Sold | ListingStatus::Cancelled, _) => {
                msg!("Rejected {:?} on {:?} listing", action, self);
                err!(StorefrontError::IllegalTransition)
            }
        }
    }
}
