//! On-chain account model

mod codec;

pub mod account;
pub mod listing;
pub mod master_edition;
pub mod metadata;
pub mod mint;

pub use account::*;
pub use listing::*;
pub use master_edition::*;
pub use metadata::*;
pub use mint::*;
