pub mod buy;
pub mod cancel;
pub mod encoding;
pub mod list;
pub mod mint_nft;
pub mod transfer;

pub use buy::*;
pub use cancel::*;
pub use list::*;
pub use mint_nft::*;
pub use transfer::*;
