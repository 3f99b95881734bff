mod forward;
pub mod target;

pub use forward::{Forwarder, rewrite_request};
pub use target::ProxyTarget;
