//! HTTP/1.1 response model and wire encoding.
//!
//! Responses are held as owned (status, headers, body) triples; framing
//! headers (Content-Length, Connection, Date, Server) are recomputed at
//! encode time so stored responses stay end-to-end only.

mod response;
pub mod responses;

pub use response::HttpResponse;
pub use response::SERVER_NAME;
