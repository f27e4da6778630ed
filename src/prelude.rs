pub use crate::{Error, Result};

pub use crate::peer::{PeerHandle, PeerState};
pub use crate::session_id::SessionId;

pub use actix::{Actor, Handler, Recipient};
pub use actix::{ActorContext, AsyncContext, Context};
pub use actix::{Addr, MessageResult};

pub use tokio::time::Duration;

pub use std::sync::Arc;

pub use crate::colored::Colorize;

pub use tracing::{debug, error, info, warn};
