pub mod user_repo;
pub use user_repo::UserRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod sale_repo;
pub use sale_repo::SaleRepository;
pub mod installment_repo;
pub use installment_repo::InstallmentRepository;
