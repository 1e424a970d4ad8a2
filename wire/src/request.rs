//! Outbound request vocabulary.

use std::fmt;

use crate::payload::SHEET_GEOMETRY_COMMAND;

#[cfg(test)]
#[path = "request_test.rs"]
mod request_test;

/// One tile position inside a fetch request, in twips, with the revision the
/// client already holds (`0` when it holds nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSlot {
    pub x: i64,
    pub y: i64,
    pub old_wire_id: u64,
}

/// A fetch for one or more same-sized tiles of one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBatch {
    pub part: i32,
    pub pixel_size: u32,
    pub tile_twips: i64,
    pub slots: Vec<TileSlot>,
}

/// A request the client sends to the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Fetch a single tile.
    Tile(TileBatch),
    /// Fetch a rectangle of tiles in one round trip.
    TileCombine(TileBatch),
    /// Drop every queued tile render for this client.
    CancelTiles,
    /// Announce the visible document area in twips.
    ClientVisibleArea { x: i64, y: i64, width: i64, height: i64 },
    /// Announce the tile geometry for the current zoom.
    ClientZoom { tile_pixel_width: u32, tile_pixel_height: u32, tile_twip_width: i64, tile_twip_height: i64 },
    /// Acknowledge consumed tile messages, by wire id.
    TileProcessed { wire_ids: Vec<u64> },
    /// Open a document; the kernel starts streaming once it is loaded.
    Load { url: String },
    /// Ask for spreadsheet row/column geometry. With neither axis set the
    /// kernel answers with both axes in full.
    SheetGeometry { columns: bool, rows: bool },
}

impl Request {
    /// Render the request as its wire text.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Number of tiles a fetch request asks for; zero for other requests.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        match self {
            Self::Tile(batch) | Self::TileCombine(batch) => batch.slots.len(),
            _ => 0,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tile(batch) => {
                let slot = batch.slots.first().copied().unwrap_or(TileSlot { x: 0, y: 0, old_wire_id: 0 });
                write!(
                    f,
                    "tile nviewid=0 part={} width={px} height={px} tileposx={} tileposy={} \
                     tilewidth={tw} tileheight={tw} oldwid={}",
                    batch.part,
                    slot.x,
                    slot.y,
                    slot.old_wire_id,
                    px = batch.pixel_size,
                    tw = batch.tile_twips,
                )
            }
            Self::TileCombine(batch) => {
                write!(
                    f,
                    "tilecombine nviewid=0 part={} width={px} height={px} tileposx={} tileposy={} \
                     oldwid={} tilewidth={tw} tileheight={tw}",
                    batch.part,
                    join(batch.slots.iter().map(|s| s.x)),
                    join(batch.slots.iter().map(|s| s.y)),
                    join(batch.slots.iter().map(|s| s.old_wire_id)),
                    px = batch.pixel_size,
                    tw = batch.tile_twips,
                )
            }
            Self::CancelTiles => f.write_str("canceltiles"),
            Self::ClientVisibleArea { x, y, width, height } => {
                write!(f, "clientvisiblearea x={x} y={y} width={width} height={height}")
            }
            Self::ClientZoom { tile_pixel_width, tile_pixel_height, tile_twip_width, tile_twip_height } => {
                write!(
                    f,
                    "clientzoom tilepixelwidth={tile_pixel_width} tilepixelheight={tile_pixel_height} \
                     tiletwipwidth={tile_twip_width} tiletwipheight={tile_twip_height}"
                )
            }
            Self::TileProcessed { wire_ids } => {
                write!(f, "tileprocessed wids={}", join(wire_ids.iter()))
            }
            Self::Load { url } => write!(f, "load url={}", urlencoding::encode(url)),
            Self::SheetGeometry { columns, rows } => {
                write!(f, "commandvalues command={SHEET_GEOMETRY_COMMAND}")?;
                if !columns && !rows {
                    return Ok(());
                }
                let axes = [(*columns, "columns=1"), (*rows, "rows=1")];
                let args: Vec<&str> = axes
                    .into_iter()
                    .filter_map(|(wanted, arg)| wanted.then_some(arg))
                    .chain(["sizes=1", "hidden=1", "filtered=1", "groups=1"])
                    .collect();
                write!(f, "?{}", args.join("&"))
            }
        }
    }
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}
