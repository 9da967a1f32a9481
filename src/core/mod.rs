pub mod ledger_manager;
pub mod services;
pub mod time;

pub use ledger_manager::{AddOutcome, LedgerManager, OpenReport};
pub use time::{Clock, FixedClock, SystemClock};
