pub mod allocation;
pub mod auth;
pub mod client_service;
pub mod collections_service;
pub mod dashboard_service;
pub mod document_service;
pub mod installment_service;
pub mod notification_service;
pub mod sale_service;
pub mod status;
