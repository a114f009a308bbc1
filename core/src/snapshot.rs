//! Wire formats for persisted team state and designer save files.

use std::{collections::BTreeMap, fmt};

use serde::{
    de::{
        value::{MapAccessDeserializer, SeqAccessDeserializer},
        MapAccess, SeqAccess, Visitor,
    },
    Deserialize, Deserializer, Serialize,
};

use crate::{CellCoord, GridSize, Tile, TileId, WallRecord};

/// Sparse, advisory free-text notes keyed by tile identifier.
pub type Descriptions = BTreeMap<TileId, String>;

/// Complete state of one team's maze, written and read wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MazeSnapshot {
    /// Side length of the grid.
    pub size: u32,
    /// Every tile in row-major order.
    pub tiles: Vec<Tile>,
    /// Sparse wall records, always including the END cell.
    pub walls: Vec<WallRecord>,
    /// Coordinates of trap tiles.
    #[serde(rename = "boobytraps", default)]
    pub traps: Vec<CellCoord>,
    /// Trap tiles that already fired; a trap only fires on its first
    /// completion.
    #[serde(default)]
    pub sprung_traps: Vec<CellCoord>,
    /// Notes shown for regular tiles.
    #[serde(default)]
    pub tile_descriptions: Descriptions,
    /// Notes shown when a trap is sprung.
    #[serde(default)]
    pub trap_descriptions: Descriptions,
}

impl MazeSnapshot {
    /// Extracts the layout portion of the snapshot as a designer save file.
    ///
    /// Completion progress is not part of a save file.
    #[must_use]
    pub fn to_save_payload(&self) -> SavePayload {
        SavePayload {
            size: Some(self.size),
            maze_walls: self.walls.clone(),
            traps: self.traps.clone(),
            tile_descriptions: self.tile_descriptions.clone(),
            trap_descriptions: self.trap_descriptions.clone(),
        }
    }
}

/// Layout produced by the maze designer and adopted verbatim by a new maze.
///
/// Older save files are a bare array of wall records; those deserialize into
/// a payload with no traps or descriptions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    /// Side length of the grid; the default size when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Sparse wall records.
    pub maze_walls: Vec<WallRecord>,
    /// Coordinates of trap tiles.
    #[serde(rename = "boobytraps")]
    pub traps: Vec<CellCoord>,
    /// Notes shown for regular tiles.
    pub tile_descriptions: Descriptions,
    /// Notes shown when a trap is sprung.
    pub trap_descriptions: Descriptions,
}

impl SavePayload {
    /// Side length the payload asks for.
    #[must_use]
    pub fn side(&self) -> u32 {
        self.size.unwrap_or(GridSize::DEFAULT.side())
    }
}

impl<'de> Deserialize<'de> for SavePayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = SavePayload;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a save document or an array of wall records")
    }

    fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let maze_walls = Vec::<WallRecord>::deserialize(SeqAccessDeserializer::new(seq))?;
        Ok(SavePayload {
            maze_walls,
            ..SavePayload::default()
        })
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let document = SaveDocument::deserialize(MapAccessDeserializer::new(map))?;
        Ok(SavePayload {
            size: document.size,
            maze_walls: document.maze_walls,
            traps: document.boobytraps,
            tile_descriptions: document.tile_descriptions,
            trap_descriptions: document.trap_descriptions,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveDocument {
    #[serde(default)]
    size: Option<u32>,
    maze_walls: Vec<WallRecord>,
    #[serde(default)]
    boobytraps: Vec<CellCoord>,
    #[serde(default)]
    tile_descriptions: Descriptions,
    #[serde(default)]
    trap_descriptions: Descriptions,
}
