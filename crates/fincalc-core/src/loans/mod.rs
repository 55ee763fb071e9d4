pub mod amortization;
pub mod balance_transfer;
