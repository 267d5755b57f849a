//! Block texture atlas lookup.
//!
//! The atlas is a single image split into a grid of square tiles. An [`AtlasLayout`]
//! says which tile each face of each block type uses; building a [`BlockAtlas`] from a
//! layout validates every entry up front, so looking a face up while meshing can never
//! fail for a block type the atlas supports.
//!
//! The layout doubles as the list of block types that are valid in the world: terrain
//! generation rejects chunks containing a block type the atlas has no textures for.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use log::{debug, info};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::voxels::block::{block_side::BlockSide, block_type::BlockType};

/// Default tiles for each block id, in face order [Front, Back, Left, Right, Top, Bottom].
static DEFAULT_FACE_TILES: phf::Map<u8, [u32; 6]> = phf_map! {
    1u8 => [1, 1, 1, 1, 1, 1], // DIRT
    2u8 => [2, 2, 2, 2, 3, 1], // GRASS (sides: 2, top: 3, bottom: dirt)
    3u8 => [4, 4, 4, 4, 4, 4], // STONE
    4u8 => [5, 5, 5, 5, 6, 6], // WOOD (bark sides, rings on the ends)
    5u8 => [7, 7, 7, 7, 7, 7], // LEAVES
    6u8 => [0, 0, 0, 0, 0, 0], // SAND
};

/// Grid size of the default atlas image.
const DEFAULT_ATLAS_COLUMNS: u32 = 4;
const DEFAULT_ATLAS_ROWS: u32 = 2;

/// Errors raised while loading or validating an atlas.
#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("atlas layout parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("atlas image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("atlas grid must have at least one column and one row, got {columns}x{rows}")]
    EmptyGrid { columns: u32, rows: u32 },
    #[error("{block:?} {side:?} uses tile {tile} but the atlas only has {tiles} tiles")]
    TileOutOfRange {
        block: BlockType,
        side: BlockSide,
        tile: u32,
        tiles: u32,
    },
    #[error("{0:?} is listed more than once in the atlas layout")]
    DuplicateBlock(BlockType),
    #[error("AIR is never rendered and cannot be given textures")]
    AirTextured,
    #[error("atlas image is {width}x{height}, expected {expected_width}x{expected_height} for {tile_size}px tiles")]
    ImageSize {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
        tile_size: u32,
    },
}

/// Tiles used by one block type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFaces {
    /// The block being textured
    pub block: BlockType,
    /// Tile index per face, in face order [Front, Back, Left, Right, Top, Bottom]
    pub faces: [u32; 6],
}

/// Serializable description of the atlas grid and the tile assigned to each block face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    /// Number of tile columns in the atlas image
    pub columns: u32,
    /// Number of tile rows in the atlas image
    pub rows: u32,
    /// Per-block face tiles
    pub blocks: Vec<BlockFaces>,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        let mut blocks: Vec<BlockFaces> = DEFAULT_FACE_TILES
            .entries()
            .filter_map(|(id, faces)| {
                BlockType::from_id(*id).map(|block| BlockFaces {
                    block,
                    faces: *faces,
                })
            })
            .collect();
        blocks.sort_by_key(|entry| entry.block);

        AtlasLayout {
            columns: DEFAULT_ATLAS_COLUMNS,
            rows: DEFAULT_ATLAS_ROWS,
            blocks,
        }
    }
}

impl AtlasLayout {
    /// Reads a layout from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AtlasError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let layout = serde_json::from_reader(reader)?;
        Ok(layout)
    }

    /// Parses a layout from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, AtlasError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Total number of tiles in the grid.
    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }
}

/// A rectangle inside the atlas image, in normalized (0.0-1.0) texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureRegion {
    /// Index of the tile this region covers
    pub tile: u32,
    /// Left edge
    pub u_min: f32,
    /// Top edge
    pub v_min: f32,
    /// Right edge
    pub u_max: f32,
    /// Bottom edge
    pub v_max: f32,
}

/// Immutable lookup table from (block type, face) to texture region.
#[derive(Debug, Clone)]
pub struct BlockAtlas {
    columns: u32,
    rows: u32,
    regions: [Option<[TextureRegion; 6]>; BlockType::COUNT],
}

impl BlockAtlas {
    /// Builds and validates an atlas from a layout.
    ///
    /// # Errors
    /// Any entry that cannot be resolved (tile outside the grid, duplicate block,
    /// textured air, empty grid) is reported here rather than during meshing.
    pub fn from_layout(layout: &AtlasLayout) -> Result<Self, AtlasError> {
        if layout.columns == 0 || layout.rows == 0 {
            return Err(AtlasError::EmptyGrid {
                columns: layout.columns,
                rows: layout.rows,
            });
        }

        let tiles = layout.tile_count();
        let mut seen = HashSet::new();
        let mut regions = [None; BlockType::COUNT];

        for entry in &layout.blocks {
            if !entry.block.is_solid() {
                return Err(AtlasError::AirTextured);
            }
            if !seen.insert(entry.block) {
                return Err(AtlasError::DuplicateBlock(entry.block));
            }

            let mut faces = [TextureRegion::default(); 6];
            for side in BlockSide::all() {
                let tile = entry.faces[side.index()];
                if tile >= tiles {
                    return Err(AtlasError::TileOutOfRange {
                        block: entry.block,
                        side,
                        tile,
                        tiles,
                    });
                }
                faces[side.index()] = Self::region_for_tile(tile, layout.columns, layout.rows);
            }
            regions[entry.block.id() as usize] = Some(faces);
        }

        debug!(
            "Built {}x{} block atlas for {} block types",
            layout.columns,
            layout.rows,
            seen.len()
        );

        Ok(BlockAtlas {
            columns: layout.columns,
            rows: layout.rows,
            regions,
        })
    }

    /// Builds an atlas from an encoded image and a layout, checking the image matches
    /// the layout's grid of `tile_size` pixel tiles.
    pub fn from_image_bytes(
        bytes: &[u8],
        tile_size: u32,
        layout: &AtlasLayout,
    ) -> Result<Self, AtlasError> {
        let image = image::load_from_memory(bytes)?;
        let (width, height) = (image.width(), image.height());
        let expected_width = layout.columns * tile_size;
        let expected_height = layout.rows * tile_size;

        if width != expected_width || height != expected_height {
            return Err(AtlasError::ImageSize {
                width,
                height,
                expected_width,
                expected_height,
                tile_size,
            });
        }

        info!("Loaded {}x{} atlas image", width, height);
        Self::from_layout(layout)
    }

    fn region_for_tile(tile: u32, columns: u32, rows: u32) -> TextureRegion {
        let column = tile % columns;
        let row = tile / columns;
        TextureRegion {
            tile,
            u_min: column as f32 / columns as f32,
            v_min: row as f32 / rows as f32,
            u_max: (column + 1) as f32 / columns as f32,
            v_max: (row + 1) as f32 / rows as f32,
        }
    }

    /// Looks up the texture for one face of a block.
    ///
    /// # Returns
    /// `None` for `AIR` and for block types the layout did not include.
    pub fn get_block_texture(&self, block_type: BlockType, side: BlockSide) -> Option<TextureRegion> {
        self.regions[block_type.id() as usize].map(|faces| faces[side.index()])
    }

    /// Whether `block_type` can be placed in the world with this atlas.
    ///
    /// `AIR` is always supported since it is never rendered.
    pub fn supports(&self, block_type: BlockType) -> bool {
        !block_type.is_solid() || self.regions[block_type.id() as usize].is_some()
    }

    /// Grid size of the atlas as (columns, rows).
    pub fn grid(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

impl Default for BlockAtlas {
    fn default() -> Self {
        Self::from_layout(&AtlasLayout::default()).expect("default atlas layout is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_covers_every_solid_block() {
        let atlas = BlockAtlas::default();
        for block_type in BlockType::solid_types() {
            for side in BlockSide::all() {
                assert!(atlas.get_block_texture(block_type, side).is_some());
            }
        }
        assert!(atlas.get_block_texture(BlockType::AIR, BlockSide::TOP).is_none());
    }

    #[test]
    fn grass_top_differs_from_sides() {
        let atlas = BlockAtlas::default();
        let top = atlas.get_block_texture(BlockType::GRASS, BlockSide::TOP).unwrap();
        let side = atlas.get_block_texture(BlockType::GRASS, BlockSide::LEFT).unwrap();
        assert_eq!(top.tile, 3);
        assert_eq!(side.tile, 2);
        assert_eq!(top.u_min, 0.75);
        assert_eq!(top.u_max, 1.0);
        assert_eq!(top.v_min, 0.0);
        assert_eq!(top.v_max, 0.5);
    }

    #[test]
    fn out_of_range_tile_is_rejected_at_load() {
        let layout = AtlasLayout {
            columns: 2,
            rows: 1,
            blocks: vec![BlockFaces {
                block: BlockType::STONE,
                faces: [0, 0, 0, 0, 2, 0],
            }],
        };
        match BlockAtlas::from_layout(&layout) {
            Err(AtlasError::TileOutOfRange { side, tile, .. }) => {
                assert_eq!(side, BlockSide::TOP);
                assert_eq!(tile, 2);
            }
            other => panic!("expected TileOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_and_air_entries_are_rejected() {
        let duplicate = AtlasLayout {
            columns: 1,
            rows: 1,
            blocks: vec![
                BlockFaces { block: BlockType::DIRT, faces: [0; 6] },
                BlockFaces { block: BlockType::DIRT, faces: [0; 6] },
            ],
        };
        assert!(matches!(
            BlockAtlas::from_layout(&duplicate),
            Err(AtlasError::DuplicateBlock(BlockType::DIRT))
        ));

        let air = AtlasLayout {
            columns: 1,
            rows: 1,
            blocks: vec![BlockFaces { block: BlockType::AIR, faces: [0; 6] }],
        };
        assert!(matches!(BlockAtlas::from_layout(&air), Err(AtlasError::AirTextured)));
    }

    #[test]
    fn layout_parses_from_json() {
        let layout = AtlasLayout::from_json_str(
            r#"{ "columns": 2, "rows": 2, "blocks": [ { "block": "stone", "faces": [3, 3, 3, 3, 3, 3] } ] }"#,
        )
        .unwrap();
        let atlas = BlockAtlas::from_layout(&layout).unwrap();
        assert!(atlas.supports(BlockType::STONE));
        assert!(!atlas.supports(BlockType::GRASS));
        assert!(atlas.supports(BlockType::AIR));
    }

    #[test]
    fn image_dimensions_must_match_grid() {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::new(64, 32))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let layout = AtlasLayout::default();
        assert!(BlockAtlas::from_image_bytes(&bytes, 16, &layout).is_ok());
        assert!(matches!(
            BlockAtlas::from_image_bytes(&bytes, 8, &layout),
            Err(AtlasError::ImageSize { .. })
        ));
    }
}
