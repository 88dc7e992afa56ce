pub mod settlement;

pub use settlement::{Buyer, CreatedTransaction, SettledTransaction, SettlementService};
