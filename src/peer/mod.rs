mod handle;
mod state;

pub use handle::PeerHandle;
pub use state::{PeerState, PeerTable};
