//! Snapshot codec: the tagged records persisted between restarts.
//!
//! Every registry entry encodes to `{"type": tag, ...fields}`. Decoding
//! dispatches on the tag and re-binds persisted role ids against the
//! platform's live role set; an id the platform no longer knows loads as a
//! dangling entry rather than failing the snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::colour::Colour;
use crate::error::SnapshotError;
use crate::rank::{LiveRoles, OrderedRankGroup, Rank, Ranklike, RealizedRank, UnorderedRankGroup};

/// Type tags. Changing one invalidates every persisted snapshot.
pub const TAG_RANK: &str = "rank";
pub const TAG_REALIZED: &str = "realized";
pub const TAG_UNORDERED: &str = "group";
pub const TAG_ORDERED: &str = "ordered-group";

#[derive(Debug, Serialize, Deserialize)]
struct RankRecord {
    name: String,
    colour: Colour,
}

#[derive(Debug, Serialize, Deserialize)]
struct RealizedRecord {
    name: String,
    role_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupRecord {
    name: String,
    members: Vec<Value>,
    #[serde(default)]
    realized: bool,
}

impl Ranklike {
    /// Encode into the tagged record form.
    pub fn to_record(&self) -> Value {
        match self {
            Self::Rank(rank) => json!({
                "type": TAG_RANK,
                "name": rank.name,
                "colour": rank.colour,
            }),
            Self::Realized(rank) => json!({
                "type": TAG_REALIZED,
                "name": rank.name,
                "role_id": rank.role_id,
            }),
            Self::Unordered(group) => json!({
                "type": TAG_UNORDERED,
                "name": group.name,
                "members": group.members.iter().map(Ranklike::to_record).collect::<Vec<_>>(),
            }),
            Self::Ordered(group) => json!({
                "type": TAG_ORDERED,
                "name": group.name,
                "members": group.members.iter().map(Ranklike::to_record).collect::<Vec<_>>(),
                "realized": group.realized,
            }),
        }
    }

    /// Decode one tagged record.
    pub fn from_record(record: &Value, live: &LiveRoles) -> Result<Self, SnapshotError> {
        let tag = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SnapshotError::MissingTypeTag)?;
        match tag {
            TAG_RANK => {
                let rec: RankRecord = serde_json::from_value(record.clone())?;
                Ok(Self::Rank(Rank::new(rec.name, rec.colour)))
            }
            TAG_REALIZED => {
                let rec: RealizedRecord = serde_json::from_value(record.clone())?;
                Ok(Self::Realized(RealizedRank::rehydrated(rec.name, rec.role_id, live)))
            }
            TAG_UNORDERED => {
                let rec: GroupRecord = serde_json::from_value(record.clone())?;
                Ok(Self::Unordered(UnorderedRankGroup {
                    name: rec.name,
                    members: decode_members(&rec.members, live)?,
                }))
            }
            TAG_ORDERED => {
                let rec: GroupRecord = serde_json::from_value(record.clone())?;
                Ok(Self::Ordered(OrderedRankGroup {
                    name: rec.name,
                    members: decode_members(&rec.members, live)?,
                    realized: rec.realized,
                }))
            }
            other => Err(SnapshotError::UnknownTypeTag(other.to_owned())),
        }
    }
}

fn decode_members(records: &[Value], live: &LiveRoles) -> Result<Vec<Ranklike>, SnapshotError> {
    records.iter().map(|record| Ranklike::from_record(record, live)).collect()
}
