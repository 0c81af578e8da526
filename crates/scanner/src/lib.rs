//! Scanner - network collaborators of the fingerprinting engine
//!
//! - `TcpDiscovery`: finds hosts with the HTTP port open
//! - `ReqwestProbe`: performs the GETs the engine and plugins issue

mod discovery;
mod http;

pub use discovery::TcpDiscovery;
pub use http::ReqwestProbe;
