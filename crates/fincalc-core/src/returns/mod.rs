pub mod xirr;
