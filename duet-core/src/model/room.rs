use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ROOM_ID_LEN: usize = 8;
const MIN_GENERATED: u32 = 10_000_000;
const MAX_GENERATED: u32 = 99_999_999;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomIdError {
    #[error("room id must be exactly 8 ASCII digits, got {0:?}")]
    Malformed(String),
}

/// Numeric 8-digit room identifier shared by both call participants.
///
/// Generated ids never start with `0`; supplied ids only have to be
/// eight ASCII digits so that a known room can always be rejoined.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    pub fn generate() -> Self {
        let n = rand::thread_rng().gen_range(MIN_GENERATED..=MAX_GENERATED);
        Self(n.to_string())
    }

    pub fn parse(s: &str) -> Result<Self, RoomIdError> {
        if s.len() == ROOM_ID_LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(RoomIdError::Malformed(s.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
