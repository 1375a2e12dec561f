use serde::{Deserialize, Serialize};

/// What a list entry points at. `Collection` never appears on a stored
/// row: it is a virtual kind that expands to its member movies before any
/// list mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Movie,
    Series,
    Episode,
    Collection,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Movie => "movie",
            ItemKind::Series => "series",
            ItemKind::Episode => "episode",
            ItemKind::Collection => "collection",
        }
    }

    /// Composite kinds are flattened to their member items before transfer.
    pub fn is_composite(&self) -> bool {
        matches!(self, ItemKind::Series | ItemKind::Collection)
    }

    /// Kinds that may be stored on a list row.
    pub fn is_storable(&self) -> bool {
        !matches!(self, ItemKind::Collection)
    }
}

impl TryFrom<&str> for ItemKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "movie" => Ok(ItemKind::Movie),
            "series" => Ok(ItemKind::Series),
            "episode" => Ok(ItemKind::Episode),
            "collection" => Ok(ItemKind::Collection),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Personal,
    Custom,
    Shared,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Personal => "personal",
            ListKind::Custom => "custom",
            ListKind::Shared => "shared",
        }
    }
}

impl Default for ListKind {
    fn default() -> Self {
        ListKind::Custom
    }
}

impl TryFrom<&str> for ListKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "personal" => Ok(ListKind::Personal),
            "custom" => Ok(ListKind::Custom),
            "shared" => Ok(ListKind::Shared),
            _ => Err(()),
        }
    }
}
