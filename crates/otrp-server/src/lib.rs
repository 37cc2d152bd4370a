//! The prekey server: DAKE state machine, session manager, stored
//! keypair loading, and the `Server` façade that ties them to a
//! pluggable ensemble store.

pub mod dake;
pub mod error;
pub mod keypair;
pub mod server;
pub mod session;

pub use error::ServerError;
pub use server::Server;
pub use session::{DakePhase, Session, SessionManager};
