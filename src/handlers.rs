// src/handlers.rs

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

pub mod audit;
pub mod auth;
pub mod barcode;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod prices;
pub mod purchases;
pub mod rbac;
pub mod sales;
pub mod suppliers;
pub mod users;

/// Configura os headers para o navegador baixar o PDF.
pub fn pdf_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
    ];
    (headers, bytes).into_response()
}
