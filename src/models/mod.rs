pub mod message;
pub mod participant;

pub use message::Message;
pub use participant::{NewParticipant, Participant, ParticipantId};
