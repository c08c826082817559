pub mod auth;
pub mod clients;
pub mod collections;
pub mod dashboard;
pub mod installments;
pub mod reports;
pub mod sales;
