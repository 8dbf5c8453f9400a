pub mod api;
pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod mutation;
pub mod notify;
pub mod response;
pub mod session;
pub mod store;
pub mod views;

pub mod dto {
    pub mod auth;
    pub mod invoices;
}

pub mod services {
    pub mod auth_service;
    pub mod invoice_service;
    pub mod transaction_service;
}
