mod delivery;
mod ledger;
mod money;
mod period;

pub use delivery::*;
pub use ledger::*;
pub use money::*;
pub use period::*;
