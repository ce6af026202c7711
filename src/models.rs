pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod pricing;
pub mod product;
pub mod purchase;
pub mod rbac;
pub mod sales;
pub mod supplier;
