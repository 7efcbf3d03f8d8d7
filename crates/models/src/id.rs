use std::str::FromStr;

// Ids embed milliseconds since this epoch rather than the Unix epoch,
// which keeps the high bit clear for decades and makes the hex rendering
// identical whether the value is read as signed or unsigned.
const EPOCH_MILLIS: u64 = 1_577_836_800_000; // 2020-01-01T00:00:00Z

/// Id is a compact 8-byte identifier assigned to notifications and
/// schedule entries. It packs (timestamp, sequence, shard) so that ids
/// from one generator are unique and monotonically increasing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; 8]);

impl Id {
    pub fn new(b: [u8; 8]) -> Self {
        Self(b)
    }
    pub fn zero() -> Self {
        Self::new([0; 8])
    }
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 8]
    }

    /// Pack an Id from its parts, or panic if a part is out of range.
    pub fn from_parts(timestamp: u64, seq: u16, shard: u16) -> Self {
        assert!(seq < 1 << 13, "sequence number out of range");
        assert!(shard < 1 << 10, "shard id out of range");
        let packed = timestamp << 23 | (seq as u64) << 10 | shard as u64;
        Self::new(packed.to_be_bytes())
    }

    /// Unpack an Id into (timestamp, sequence, shard).
    pub fn into_parts(self) -> (u64, u16, u16) {
        let packed = u64::from_be_bytes(self.0);
        let timestamp = packed >> 23;
        let seq = ((packed >> 10) & ((1 << 13) - 1)) as u16;
        let shard = (packed & ((1 << 10) - 1)) as u16;
        (timestamp, seq, shard)
    }
}

impl FromStr for Id {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let u = u64::from_str_radix(s, 16)?;
        Ok(Self(u.to_be_bytes()))
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0.iter() {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl serde::Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        format!("{self}").serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let str_val = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        Id::from_str(str_val.as_ref()).map_err(|err| D::Error::custom(format!("invalid id: {err}")))
    }
}

/// IdGenerator issues unique, monotonically increasing Ids.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    shard: u16,
    seq: u16,
    last_timestamp: u64,
}

impl IdGenerator {
    pub fn new(shard: u16) -> Self {
        Self {
            shard,
            seq: 0,
            last_timestamp: 0,
        }
    }

    pub fn next(&mut self) -> Id {
        let mut timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        timestamp -= EPOCH_MILLIS;
        // System time is not guaranteed monotonic; the generator is.
        timestamp = timestamp.max(self.last_timestamp);

        if timestamp == self.last_timestamp {
            if self.seq >= (1 << 13) - 1 {
                // Sequence exhausted within this millisecond.
                // Borrow from the next one.
                self.last_timestamp += 1;
                timestamp += 1;
                self.seq = 0;
            } else {
                self.seq += 1;
            }
        } else {
            self.seq = 0;
            self.last_timestamp = timestamp;
        }
        Id::from_parts(timestamp, self.seq, self.shard)
    }
}
