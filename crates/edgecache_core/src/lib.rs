//! Server core: listener/accept loop, per-connection worker and the edge
//! cache request handler.

pub mod handler;
pub mod master;
pub mod resource;
pub mod worker;

pub use handler::EdgeHandler;
pub use master::Master;
pub use worker::handle_connection;
