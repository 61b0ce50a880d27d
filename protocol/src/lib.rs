//! Wire protocol shared by the server and the client engine: the message
//! envelope and the typed DTOs carried inside it.

pub mod envelope;
pub mod message;

pub use envelope::{CONNECT, Envelope, EnvelopeError, MOVE, STATE_UPDATE, now_ms};
pub use message::{
    BoardDto, ClientMessage, CollisionDto, CollisionKind, ConnectAck, ConnectRequest,
    GameStateDto, MessageError, MovePayload, PlayerDto, ServerMessage,
};
