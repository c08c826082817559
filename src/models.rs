pub mod auth;
pub mod client;
pub mod collections;
pub mod dashboard;
pub mod installment;
pub mod report;
pub mod sale;
