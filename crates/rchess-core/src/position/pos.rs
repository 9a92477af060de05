//! 局面本体

use std::fmt;

use super::state::UndoRecord;
use super::zobrist::{zobrist_castling, zobrist_ep, zobrist_psq, zobrist_side};
use crate::bitboard::Bitboard;
use crate::movegen;
use crate::types::{Color, Piece, PieceType, Square};

// =============================================================================
// meta のビット配置
// =============================================================================

pub(crate) const STM_MASK: u32 = 1;
pub(crate) const CR_SHIFT: u32 = 1;
pub(crate) const CR_MASK: u32 = 0xF << CR_SHIFT;
pub(crate) const EP_SHIFT: u32 = 5;
pub(crate) const EP_MASK: u32 = 0x3F << EP_SHIFT;
pub(crate) const EP_NONE: u32 = 63;
pub(crate) const HC_SHIFT: u32 = 11;
pub(crate) const HC_MASK: u32 = 0x7F << HC_SHIFT;
pub(crate) const HC_MAX: u32 = 0x7F;
pub(crate) const FM_SHIFT: u32 = 18;
pub(crate) const FM_MASK: u32 = 0x1FF << FM_SHIFT;
pub(crate) const FM_MAX: u32 = 0x1FF;

/// 白のキングサイドキャスリング権
pub const CASTLE_WK: u8 = 1;
/// 白のクイーンサイドキャスリング権
pub const CASTLE_WQ: u8 = 2;
/// 黒のキングサイドキャスリング権
pub const CASTLE_BK: u8 = 4;
/// 黒のクイーンサイドキャスリング権
pub const CASTLE_BQ: u8 = 8;

/// 局面
///
/// 駒ごとの Bitboard 12 枚と、手番・キャスリング権・EP・手数を詰めた `meta` を持つ。
/// 指し手は `make_move` / `undo_move` でその場で適用・巻き戻しする。
/// 盤面配列と色別 Bitboard は駒 Bitboard のキャッシュで、常に整合させる。
#[derive(Clone)]
pub struct Position {
    pub(super) pieces: [Bitboard; Piece::NUM],
    pub(super) by_color: [Bitboard; Color::NUM],
    pub(super) board: [Option<Piece>; Square::NUM],
    pub(super) meta: u32,
    pub(super) key: u64,
    pub(super) undo: Vec<UndoRecord>,
    /// 開始局面を含むハッシュ履歴（千日手判定用）
    pub(super) history: Vec<u64>,
}

impl Position {
    /// 駒の無い盤
    pub(super) fn empty() -> Self {
        Self {
            pieces: [Bitboard::EMPTY; Piece::NUM],
            by_color: [Bitboard::EMPTY; Color::NUM],
            board: [None; Square::NUM],
            meta: EP_NONE << EP_SHIFT,
            key: 0,
            undo: Vec::with_capacity(256),
            history: Vec::with_capacity(256),
        }
    }

    // =========================================================================
    // 駒の配置
    // =========================================================================

    #[inline]
    pub(super) fn put_piece(&mut self, piece: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.pieces[piece.index()] |= bb;
        self.by_color[piece.color().index()] |= bb;
        self.board[sq.index()] = Some(piece);
    }

    #[inline]
    pub(super) fn remove_piece(&mut self, piece: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.pieces[piece.index()] ^= bb;
        self.by_color[piece.color().index()] ^= bb;
        self.board[sq.index()] = None;
    }

    // =========================================================================
    // 参照
    // =========================================================================

    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    #[inline]
    pub fn pieces_of(&self, color: Color, pt: PieceType) -> Bitboard {
        self.pieces[Piece::new(color, pt).index()]
    }

    /// 両手番の `pt`
    #[inline]
    pub fn pieces_by_type(&self, pt: PieceType) -> Bitboard {
        self.pieces_of(Color::White, pt) | self.pieces_of(Color::Black, pt)
    }

    #[inline]
    pub fn colored(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    /// キングの升（FEN 読み込み時に各色ちょうど1枚を保証している）
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        let bb = self.pieces_of(color, PieceType::King);
        Square::from_index_unchecked((bb.0.trailing_zeros() & 63) as usize)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        if self.meta & STM_MASK == 0 { Color::White } else { Color::Black }
    }

    /// キャスリング権（`CASTLE_*` の OR）
    #[inline]
    pub fn castling_rights(&self) -> u8 {
        ((self.meta & CR_MASK) >> CR_SHIFT) as u8
    }

    /// アンパッサン升（取れる駒がいるときのみ設定される）
    #[inline]
    pub fn ep_square(&self) -> Option<Square> {
        let ep = (self.meta & EP_MASK) >> EP_SHIFT;
        if ep == EP_NONE {
            None
        } else {
            Some(Square::from_index_unchecked(ep as usize))
        }
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        (self.meta & HC_MASK) >> HC_SHIFT
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        ((self.meta & FM_MASK) >> FM_SHIFT) + 1
    }

    /// 詰めた状態値（手番・キャスリング権・EP・手数）
    #[inline]
    pub fn meta(&self) -> u32 {
        self.meta
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// 開始局面からの手数（null move を含む）
    #[inline]
    pub fn game_ply(&self) -> usize {
        self.undo.len()
    }

    /// 直前の指し手の巻き戻し情報
    #[inline]
    pub fn last_undo(&self) -> Option<&UndoRecord> {
        self.undo.last()
    }

    /// ハッシュ履歴
    #[inline]
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    /// 盤面からハッシュを計算し直す
    pub fn compute_key(&self) -> u64 {
        let mut key = 0u64;
        for idx in 0..Piece::NUM {
            let piece = Piece::from_index_unchecked(idx);
            for sq in self.pieces[idx] {
                key ^= zobrist_psq(piece, sq);
            }
        }
        if self.side_to_move() == Color::Black {
            key ^= zobrist_side();
        }
        key ^= zobrist_castling(self.castling_rights());
        if let Some(ep) = self.ep_square() {
            key ^= zobrist_ep(ep);
        }
        key
    }

    // =========================================================================
    // 局面判定
    // =========================================================================

    /// 手番側が王手されているか
    #[inline]
    pub fn is_in_check(&self) -> bool {
        movegen::king_attacked(self, self.side_to_move())
    }

    /// ポーンとキング以外の駒を持っているか
    #[inline]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        (self.pieces_of(color, PieceType::Knight)
            | self.pieces_of(color, PieceType::Bishop)
            | self.pieces_of(color, PieceType::Rook)
            | self.pieces_of(color, PieceType::Queen))
        .is_not_empty()
    }

    /// 引き分け（千日手・駒不足・50手ルール）
    pub fn is_draw(&self) -> bool {
        self.is_repetition() || self.is_insufficient_material() || self.halfmove_clock() >= 100
    }

    /// 同一局面3回目
    ///
    /// 手番が同じになる偶数手前だけを、halfmove clock の範囲で遡る。
    pub fn is_repetition(&self) -> bool {
        let hsp = self.history.len();
        if hsp < 4 {
            return false;
        }
        let last = self.history[hsp - 1];
        let limit = (hsp - 1).min(self.halfmove_clock() as usize);
        let mut count = 0;
        for x in (4..=limit).step_by(2) {
            if self.history[hsp - x - 1] == last {
                count += 1;
                if count >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// 駒不足による引き分け
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.pieces_by_type(PieceType::Pawn)
            | self.pieces_by_type(PieceType::Rook)
            | self.pieces_by_type(PieceType::Queen);
        if heavy.is_not_empty() {
            return false;
        }

        let count = self.occupied().count();
        let white_count = self.colored(Color::White).count();
        let black_count = self.colored(Color::Black).count();
        let wb = self.pieces(Piece::W_BISHOP);
        let bb = self.pieces(Piece::B_BISHOP);

        if count == 4 {
            if white_count > 1 && black_count > 1 {
                // KB v KB は異色ビショップのみ指し切れる
                let opposite = wb.count() == 1
                    && bb.count() == 1
                    && first_is_light(wb) != first_is_light(bb);
                return !opposite;
            }
            let bishop_pair_mono =
                (wb.count() == 2 && single_colored(wb)) || (bb.count() == 2 && single_colored(bb));
            return bishop_pair_mono
                || self.pieces(Piece::W_KNIGHT).count() == 2
                || self.pieces(Piece::B_KNIGHT).count() == 2;
        }

        if self.pieces_by_type(PieceType::Knight).is_empty() && single_colored(wb | bb) {
            return true;
        }
        count < 4
    }
}

#[inline]
fn first_is_light(bb: Bitboard) -> bool {
    bb.lsb().is_some_and(|sq| sq.is_light())
}

/// すべて同じ色の升にあるか（空なら真）
#[inline]
fn single_colored(bb: Bitboard) -> bool {
    (bb & Bitboard::LIGHT_SQUARES).is_empty() || (bb & !Bitboard::LIGHT_SQUARES).is_empty()
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let c = Square::from_file_rank(file, rank)
                    .and_then(|sq| self.piece_on(sq))
                    .map_or('.', |p| p.to_char());
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "fen: {}", self.to_fen())?;
        write!(f, "key: {:016x}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn test_meta_accessors() {
        let p = pos("r3k2r/8/8/8/8/8/8/R3K2R b Kq - 7 42");
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.castling_rights(), CASTLE_WK | CASTLE_BQ);
        assert_eq!(p.ep_square(), None);
        assert_eq!(p.halfmove_clock(), 7);
        assert_eq!(p.fullmove_number(), 42);
    }

    #[test]
    fn test_king_square_and_piece_on() {
        let p = Position::startpos();
        assert_eq!(p.king_square(Color::White), Square::E1);
        assert_eq!(p.king_square(Color::Black), Square::E8);
        assert_eq!(p.piece_on(Square::D1), Some(Piece::W_QUEEN));
        assert_eq!(p.piece_on(Square::parse("e4").unwrap()), None);
        assert_eq!(p.occupied().count(), 32);
    }

    #[test]
    fn test_compute_key_matches_incremental_start() {
        let p = Position::startpos();
        assert_eq!(p.key(), p.compute_key());
        assert_eq!(p.history(), &[p.key()]);
    }

    #[test]
    fn test_insufficient_material_cases() {
        // K v K
        assert!(pos("8/8/4k3/8/8/3K4/8/8 w - - 0 1").is_insufficient_material());
        // KN v K
        assert!(pos("8/8/4k3/8/8/3K4/8/6N1 w - - 0 1").is_insufficient_material());
        // KB v K
        assert!(pos("8/8/4k3/8/8/3K4/8/5B2 w - - 0 1").is_insufficient_material());
        // KNN v K
        assert!(pos("8/8/4k3/8/8/3K4/8/5NN1 w - - 0 1").is_insufficient_material());
        // KB v KB 同色
        assert!(pos("8/8/4k3/8/2b5/3K4/8/5B2 w - - 0 1").is_insufficient_material());
        // KB v KB 異色
        assert!(!pos("8/8/4k3/8/8/3K4/8/2b2B2 w - - 0 1").is_insufficient_material());
        // KBN v K
        assert!(!pos("8/8/4k3/8/8/3K4/8/4BN2 w - - 0 1").is_insufficient_material());
        // ポーンがあれば不足ではない
        assert!(!pos("8/8/4k3/8/8/3K4/4P3/8 w - - 0 1").is_insufficient_material());
        // 同色ビショップ多数
        assert!(pos("8/8/4k3/8/2b5/3K4/4B3/5B2 w - - 0 1").is_insufficient_material());
    }

    #[test]
    fn test_fifty_move_draw() {
        assert!(pos("8/8/4k3/8/8/3K4/8/R7 w - - 100 80").is_draw());
        assert!(!pos("8/8/4k3/8/8/3K4/8/R7 w - - 99 80").is_draw());
    }

    #[test]
    fn test_has_non_pawn_material() {
        let p = pos("8/8/4k3/8/8/3K4/4P3/5N2 w - - 0 1");
        assert!(p.has_non_pawn_material(Color::White));
        assert!(!p.has_non_pawn_material(Color::Black));
    }
}
