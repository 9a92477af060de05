//! 基本型
//!
//! - `Color`: 手番
//! - `PieceType` / `Piece`: 駒種と駒
//! - `Square`: マス
//! - `Move` / `MoveKind`: 指し手
//! - `Value`: 評価値
//! - `Bound`: 置換表の境界

mod bound;
mod color;
mod moves;
mod piece;
mod square;
mod value;

pub use bound::Bound;
pub use color::Color;
pub use moves::{Move, MoveKind};
pub use piece::{Piece, PieceType};
pub use square::Square;
pub use value::Value;

/// 探索深さ
pub type Depth = i32;

/// 最大探索 ply
pub const MAX_PLY: i32 = 128;

/// 1局面あたりの最大指し手数
pub const MAX_MOVES: usize = 256;
