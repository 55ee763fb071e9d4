pub mod fixed;
pub mod ppf;
pub mod recurring;
pub mod ssy;
