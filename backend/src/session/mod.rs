pub mod middleware;

pub use middleware::{SESSION_COOKIE, SessionId, SessionMiddleware};
