//! HTTP adapter for session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CheckoutRequest, CheckoutResponse, CreateSessionRequest, CreateSessionResponse,
    PaymentResponse, SessionResponse, WaitStatusResponse,
};
pub use handlers::SessionHandlers;
pub use routes::session_routes;
