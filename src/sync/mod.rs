mod bridge;
mod poller;

pub use bridge::{SyncBridge, SyncEvent};
pub use poller::{PollTarget, SessionPoller};
