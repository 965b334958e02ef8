pub mod cet;
pub mod irr;
pub mod rates;
