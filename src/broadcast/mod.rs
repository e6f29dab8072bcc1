// Public API
pub use broadcaster::{Broadcaster, ConnectionState, InMemoryBroadcaster};
pub use handler::websocket_handler;
pub use messages::{LeaderboardUpdatePayload, MessageType, WebSocketMessage};
pub use socket::{SocketWrapper, ViewerConnection};

// Internal modules
mod broadcaster;
mod handler;
mod messages;
mod socket;
