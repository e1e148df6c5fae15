use std::fmt;

use crate::models::ParticipantId;

/// Directed key: messages flowing from `from` to `to`.
///
/// Two sessions in the same conversation use complementary keys, one per
/// socket, so `(a, b)` and `(b, a)` are distinct registry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub from: ParticipantId,
    pub to: ParticipantId,
}

impl PairKey {
    pub fn new(from: ParticipantId, to: ParticipantId) -> Self {
        Self { from, to }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}
