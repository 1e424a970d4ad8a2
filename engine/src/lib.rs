//! Tile cache, overlay state and render driver for a document viewer backed
//! by a remote rendering kernel.
//!
//! The kernel renders the document into fixed-size tiles and streams them
//! over a socket alongside cursor, selection and collaborator messages. This
//! crate decides which tiles to ask for, keeps what arrives, and turns
//! everything into calls on a host-provided [`RenderSurface`]. It performs no
//! I/O: the host feeds inbound frames in and sends the returned requests out.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`Engine`] facade: turns, effect execution, zoom and prefetch drivers |
//! | [`state`] | Owned [`state::EngineState`] and view refresh |
//! | [`dispatch`] | Message-type handler table and the built-in handlers |
//! | [`effect`] | Effects handlers return and [`Event`]s surfaced to the host |
//! | [`cache`] | Tile arena, visibility, fetch batching, pruning |
//! | [`tile`] | Tile identity and per-tile state |
//! | [`content`] | Bitmaps of evicted tiles, kept for revisits |
//! | [`coords`] | Twip, core-pixel and CSS-pixel conversions |
//! | [`overlay`] | Cursors, selections and collaborator markers |
//! | [`replay`] | Last zoom-invariant message per type and view |
//! | [`sheet`] | Spreadsheet row/column geometry and print-twips projection |
//! | [`zoom`] | Zoom animation state machine |
//! | [`prefetch`] | Idle-time border prefetch |
//! | [`surface`] | [`RenderSurface`] trait and a recording implementation |
//! | [`clock`] | Injectable time source |
//! | [`config`] | Tunables loaded from the environment |
//! | [`consts`] | Shared numeric constants |

pub mod cache;
pub mod clock;
pub mod config;
pub mod consts;
pub mod content;
pub mod coords;
pub mod dispatch;
pub mod effect;
pub mod engine;
pub mod overlay;
pub mod prefetch;
pub mod replay;
pub mod sheet;
pub mod state;
pub mod surface;
pub mod tile;
pub mod zoom;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use dispatch::HandlerError;
pub use effect::Event;
pub use engine::{Engine, Output};
pub use surface::{RecordingSurface, RenderSurface};
