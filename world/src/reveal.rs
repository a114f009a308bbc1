//! Visibility of tiles derived from completion state and walls.

use std::collections::BTreeSet;

use maze_bingo_core::{Tile, TileId, TileState, WallLayout};

/// Computes the set of tiles players can currently see.
///
/// START and END are always visible. Every completed tile is visible, and so
/// is each neighbour of a completed tile that is not separated from it by a
/// wall. The set is recomputed from scratch on every call.
#[must_use]
pub fn revealed(
    tiles: &[Tile],
    walls: &WallLayout,
    start: TileId,
    end: TileId,
) -> BTreeSet<TileId> {
    let size = walls.size();
    let mut visible = BTreeSet::from([start, end]);

    for tile in tiles.iter().filter(|tile| tile.completed) {
        let _ = visible.insert(tile.id);
        let Some(cell) = size.cell(tile.id) else {
            continue;
        };
        for neighbor in walls.open_neighbors(cell) {
            if let Some(id) = size.tile_id(neighbor) {
                let _ = visible.insert(id);
            }
        }
    }

    visible
}

/// Classifies a tile given the current visible set.
#[must_use]
pub fn classify(tile: &Tile, visible: &BTreeSet<TileId>) -> TileState {
    if tile.completed {
        TileState::Completed
    } else if visible.contains(&tile.id) {
        TileState::Revealed
    } else {
        TileState::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_bingo_core::{CellCoord, Direction, GridSize};

    fn tiles(size: GridSize) -> Vec<Tile> {
        (1..=u32::try_from(size.cell_count()).expect("small grid"))
            .map(|id| Tile::fresh(TileId::new(id)))
            .collect()
    }

    #[test]
    fn nothing_completed_reveals_only_terminals() {
        let size = GridSize::new(3).expect("valid size");
        let walls = WallLayout::open(size);
        let visible = revealed(&tiles(size), &walls, size.start_tile(), size.end_tile());
        assert_eq!(
            visible,
            BTreeSet::from([size.start_tile(), size.end_tile()])
        );
    }

    #[test]
    fn walls_hide_neighbors_of_completed_tiles() {
        let size = GridSize::new(3).expect("valid size");
        let mut walls = WallLayout::closed(size);
        let centre = CellCoord::new(1, 1);
        walls.open_edge(centre, Direction::West);

        let mut tiles = tiles(size);
        tiles[4].completed = true;
        tiles[4].completions_done = 1;

        let visible = revealed(&tiles, &walls, size.start_tile(), size.end_tile());
        assert_eq!(
            visible,
            BTreeSet::from([TileId::new(2), TileId::new(4), TileId::new(5), TileId::new(8)])
        );
        assert_eq!(classify(&tiles[3], &visible), TileState::Revealed);
        assert_eq!(classify(&tiles[4], &visible), TileState::Completed);
        assert_eq!(classify(&tiles[5], &visible), TileState::Locked);
    }
}
