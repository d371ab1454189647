use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::{LazyLock, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error as ThisError;
use ulid::Ulid;

///
/// GENERATOR is lazily initiated with a Mutex
/// it has to keep state to make sure key order is maintained
///

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::default()));

///
/// EntityIdError
///

#[derive(Debug, ThisError)]
pub enum EntityIdError {
    #[error("invalid entity id string")]
    InvalidString,

    #[error("monotonic error - overflow")]
    GeneratorOverflow,
}

///
/// EntityId
///
/// ULID-backed primary key for entities. Lexicographic order is creation
/// order, which keeps listing stable without a separate sort column.
///

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
#[repr(transparent)]
pub struct EntityId(Ulid);

impl EntityId {
    /// Generate a fresh id using the global monotonic generator.
    pub fn generate() -> Result<Self, EntityIdError> {
        let mut generator = GENERATOR.lock().expect("entity id generator mutex poisoned");

        generator.generate().map(Self)
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Ulid::from_parts(
            (value >> 80) as u64,
            value & ((1 << 80) - 1),
        ))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|_| EntityIdError::InvalidString)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0.to_string()
    }
}

///
/// Generator
///
/// Monotonic ULID generation without the `rand` feature: entropy is folded
/// from the clock's nanosecond remainder, and collisions within the same
/// millisecond increment the previous id instead.
///

#[derive(Default)]
struct Generator {
    previous: Ulid,
}

impl Generator {
    fn generate(&mut self) -> Result<Ulid, EntityIdError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let ts = u64::try_from(now.as_millis()).unwrap_or(u64::MAX);
        let last_ts = self.previous.timestamp_ms();

        // maybe time went backward, or it is the same ms.
        // increment instead of generating new entropy so order is maintained
        if ts <= last_ts {
            let next = self
                .previous
                .increment()
                .ok_or(EntityIdError::GeneratorOverflow)?;
            self.previous = next;

            return Ok(self.previous);
        }

        let entropy = u128::from(now.subsec_nanos()).wrapping_mul(0x2545_F491_4F6C_DD1D);
        let ulid = Ulid::from_parts(ts, entropy);

        self.previous = ulid;

        Ok(ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_generation() {
        let mut g = Generator::default();
        let a = g.generate().unwrap();
        let b = g.generate().unwrap();

        assert!(a < b);
    }

    #[test]
    fn string_round_trip() {
        let id = EntityId::generate().unwrap();
        let parsed: EntityId = id.to_string().parse().unwrap();

        assert_eq!(id, parsed);
    }
}
