//! Inflation adjustment.
//!
//! Restates the balances of inflation-adjustable accounts to the purchasing
//! power of a target month using a monthly price-index table, and builds the
//! balancing journal entry whose counterpart is the inflation-exposure
//! result (REI).

pub mod adjustment;
pub mod index;


pub use adjustment::{
    account_adjustment, adjustment_description, adjustment_lines, general_adjustment,
    AccountAdjustment, AdjustedMovement, GeneralAdjustment, ADJUSTMENT_NOTE, REI_NOTE,
};
pub use index::{factor, IndexSeries, IndexTable};
