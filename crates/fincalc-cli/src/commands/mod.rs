pub mod deposits;
pub mod investments;
pub mod loans;
pub mod returns;
pub mod scenarios;
