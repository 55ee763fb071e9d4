pub mod goal;
pub mod sip;
pub mod withdrawal;
