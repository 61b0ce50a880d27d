//! Reads a board's RLE cell file and its companion dimensions file from
//! disk and decodes them into a [`Board`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Board, Cell, SpawnPoint};

pub const DEFAULT_DIMENSIONS_PATH: &str = "assets/boards/dimensions.json";

#[derive(Debug, Error)]
pub enum BoardLoadError {
    #[error("board file not found: {0}")]
    MissingBoard(PathBuf),
    #[error("dimensions file not found: {0}")]
    MissingDims(PathBuf),
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid dimensions: width and height must both be at least 1")]
    InvalidDims,
    #[error("invalid cell entity {0}: expected 0 (empty), 1 (wall), or 2 (spawn)")]
    InvalidEntity(u8),
    #[error("run-length repeat of 0 is invalid")]
    InvalidRepeat,
    #[error("decoded {decoded} cells but board is {width}x{height} ({expected} cells)")]
    CellCountMismatch {
        decoded: usize,
        width: u32,
        height: u32,
        expected: usize,
    },
}

#[derive(Debug, Deserialize)]
struct DimensionsFile {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct RunLengthEntry {
    entity: u8,
    #[serde(default = "default_repeat")]
    repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, BoardLoadError> {
    let text =
        std::fs::read_to_string(path).map_err(|_| BoardLoadError::MissingBoard(path.to_path_buf()))?;
    serde_json::from_str(&text).map_err(|source| BoardLoadError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_dimensions_path(board_path: &Path) -> PathBuf {
    let sibling = board_path
        .parent()
        .map(|dir| dir.join("dimensions.json"))
        .unwrap_or_else(|| PathBuf::from("dimensions.json"));
    if sibling.exists() {
        sibling
    } else {
        PathBuf::from(DEFAULT_DIMENSIONS_PATH)
    }
}

pub fn load(board_path: &Path) -> Result<Board, BoardLoadError> {
    if !board_path.exists() {
        return Err(BoardLoadError::MissingBoard(board_path.to_path_buf()));
    }
    let cells: Vec<RunLengthEntry> = read_json(board_path)?;

    let dims_path = resolve_dimensions_path(board_path);
    if !dims_path.exists() {
        return Err(BoardLoadError::MissingDims(dims_path));
    }
    let dims: DimensionsFile = read_json(&dims_path)?;

    if dims.width == 0 || dims.height == 0 {
        return Err(BoardLoadError::InvalidDims);
    }

    decode(cells, dims.width, dims.height)
}

fn decode(entries: Vec<RunLengthEntry>, width: u32, height: u32) -> Result<Board, BoardLoadError> {
    let mut cells = Vec::with_capacity((width * height) as usize);
    let mut spawn_points = Vec::new();

    for entry in entries {
        if entry.repeat == 0 {
            return Err(BoardLoadError::InvalidRepeat);
        }
        let cell = match entry.entity {
            0 => Cell::Empty,
            1 => Cell::Wall,
            2 => Cell::Empty,
            other => return Err(BoardLoadError::InvalidEntity(other)),
        };
        for _ in 0..entry.repeat {
            let index = cells.len();
            if entry.entity == 2 {
                spawn_points.push(SpawnPoint {
                    x: (index as u32 % width) as i32,
                    y: (index as u32 / width) as i32,
                });
            }
            cells.push(cell);
        }
    }

    let expected = (width as usize) * (height as usize);
    if cells.len() != expected {
        return Err(BoardLoadError::CellCountMismatch {
            decoded: cells.len(),
            width,
            height,
            expected,
        });
    }

    let grid = cells
        .chunks(width as usize)
        .map(|row| row.to_vec())
        .collect();

    Ok(Board {
        width,
        height,
        grid,
        spawn_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_board_entries() -> Vec<RunLengthEntry> {
        vec![
            RunLengthEntry { entity: 1, repeat: 3 },
            RunLengthEntry { entity: 1, repeat: 1 },
            RunLengthEntry { entity: 2, repeat: 1 },
            RunLengthEntry { entity: 1, repeat: 1 },
            RunLengthEntry { entity: 1, repeat: 3 },
        ]
    }

    #[test]
    fn decodes_spawn_point_at_row_major_index() {
        let board = decode(small_board_entries(), 3, 3).unwrap();
        assert_eq!(board.spawn_points, vec![SpawnPoint { x: 1, y: 1 }]);
        assert_eq!(board.grid[1][1], Cell::Empty);
        assert_eq!(board.grid[0][0], Cell::Wall);
    }

    #[test]
    fn zero_repeat_is_rejected() {
        let entries = vec![RunLengthEntry { entity: 0, repeat: 0 }];
        assert!(matches!(
            decode(entries, 1, 1),
            Err(BoardLoadError::InvalidRepeat)
        ));
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let entries = vec![RunLengthEntry { entity: 9, repeat: 1 }];
        assert!(matches!(
            decode(entries, 1, 1),
            Err(BoardLoadError::InvalidEntity(9))
        ));
    }

    #[test]
    fn cell_count_mismatch_is_rejected() {
        let entries = vec![RunLengthEntry { entity: 0, repeat: 2 }];
        assert!(matches!(
            decode(entries, 3, 3),
            Err(BoardLoadError::CellCountMismatch { .. })
        ));
    }

    #[test]
    fn board_with_no_spawn_cells_yields_empty_list() {
        let entries = vec![RunLengthEntry { entity: 0, repeat: 9 }];
        let board = decode(entries, 3, 3).unwrap();
        assert!(board.spawn_points.is_empty());
    }

    #[test]
    fn bare_top_level_array_is_the_documented_wire_format() {
        let json = r#"[{"entity":1,"repeat":3},{"entity":0},{"entity":1,"repeat":3}]"#;
        let entries: Vec<RunLengthEntry> = serde_json::from_str(json).unwrap();
        let board = decode(entries, 7, 1).unwrap();
        assert_eq!(board.grid[0][3], Cell::Empty);
    }
}
