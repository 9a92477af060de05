//! 指し手生成器

use super::movelist::MoveList;
use crate::bitboard::{
    Bitboard, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks,
    rook_attacks,
};
use crate::position::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Position};
use crate::types::{Color, Move, MoveKind, Piece, PieceType, Square};

/// キングサイドの通り道（f, g）
const WHITE_OO_PATH: u64 = 0x60;
/// クイーンサイドの通り道（b, c, d）
const WHITE_OOO_PATH: u64 = 0x0E;
const BLACK_OO_PATH: u64 = WHITE_OO_PATH << 56;
const BLACK_OOO_PATH: u64 = WHITE_OOO_PATH << 56;

/// ポーン前進の生成モード
#[derive(Clone, Copy, PartialEq, Eq)]
enum PushMode {
    /// クイーンへの成りだけ（取る手側）
    QueenPromotions,
    /// R, B, N への成りと 1マス・2マス前進（取らない手側）
    QuietPushes,
}

#[inline]
fn sq_at(index: usize) -> Square {
    Square::from_index_unchecked(index)
}

#[inline]
fn emit_targets(list: &mut MoveList, from: Square, targets: Bitboard) {
    for to in targets {
        list.push(Move::new(from, to, MoveKind::Normal));
    }
}

#[inline]
fn emit_promotions(list: &mut MoveList, from: Square, to: Square, pieces: &[PieceType]) {
    for &pt in pieces {
        list.push(Move::new_promotion(from, to, pt));
    }
}

const ALL_PROMOTIONS: [PieceType; 4] =
    [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];
const UNDER_PROMOTIONS: [PieceType; 3] = [PieceType::Rook, PieceType::Bishop, PieceType::Knight];

/// ポーンの斜め前方（左・右）の移動先と、移動元へのオフセット
#[inline]
fn pawn_diagonals(us: Color, pawns: Bitboard) -> [(Bitboard, i32); 2] {
    match us {
        Color::White => [
            ((pawns & !Bitboard::FILE_A).shl(7), -7),
            ((pawns & !Bitboard::FILE_H).shl(9), -9),
        ],
        Color::Black => [
            ((pawns & !Bitboard::FILE_H).shr(7), 7),
            ((pawns & !Bitboard::FILE_A).shr(9), 9),
        ],
    }
}

#[inline]
fn from_offset(to: Square, delta: i32) -> Square {
    sq_at((to.index() as i32 + delta) as usize)
}

fn generate_pawn_captures(pos: &Position, us: Color, enemy: Bitboard, list: &mut MoveList) {
    let pawns = pos.pieces_of(us, PieceType::Pawn);
    let promo_rank = match us {
        Color::White => Bitboard::RANK_8,
        Color::Black => Bitboard::RANK_1,
    };
    let diagonals = pawn_diagonals(us, pawns);

    for &(targets, delta) in &diagonals {
        for to in targets & enemy & !promo_rank {
            list.push(Move::new(from_offset(to, delta), to, MoveKind::Normal));
        }
    }
    for &(targets, delta) in &diagonals {
        for to in targets & enemy & promo_rank {
            emit_promotions(list, from_offset(to, delta), to, &ALL_PROMOTIONS);
        }
    }

    if let Some(ep) = pos.ep_square() {
        // EP 升の背後に相手ポーンがいるときだけ
        let behind = sq_at(ep.index() ^ 8);
        if pos.pieces_of(us.opponent(), PieceType::Pawn).contains(behind) {
            let ep_bb = Bitboard::from_square(ep);
            for &(targets, delta) in &diagonals {
                if (targets & ep_bb).is_not_empty() {
                    list.push(Move::new(from_offset(ep, delta), ep, MoveKind::EnPassant));
                }
            }
        }
    }
}

fn generate_pawn_pushes(pos: &Position, us: Color, occ: Bitboard, list: &mut MoveList, mode: PushMode) {
    let pawns = pos.pieces_of(us, PieceType::Pawn);
    let (one, back, promo_rank, double_rank) = match us {
        Color::White => (pawns.shl(8) & !occ, -8i32, Bitboard::RANK_8, Bitboard::RANK_3),
        Color::Black => (pawns.shr(8) & !occ, 8i32, Bitboard::RANK_1, Bitboard::RANK_6),
    };

    let promos = if mode == PushMode::QueenPromotions {
        &ALL_PROMOTIONS[..1]
    } else {
        &UNDER_PROMOTIONS[..]
    };
    for to in one & promo_rank {
        emit_promotions(list, from_offset(to, back), to, promos);
    }

    if mode == PushMode::QuietPushes {
        for to in one & !promo_rank {
            list.push(Move::new(from_offset(to, back), to, MoveKind::Normal));
        }
        let two = match us {
            Color::White => (one & double_rank).shl(8) & !occ,
            Color::Black => (one & double_rank).shr(8) & !occ,
        };
        for to in two {
            list.push(Move::new(from_offset(to, 2 * back), to, MoveKind::Normal));
        }
    }
}

/// N, B, R, Q, K の移動（`targets` に含まれる升へ）
fn generate_piece_moves(pos: &Position, us: Color, occ: Bitboard, targets: Bitboard, list: &mut MoveList) {
    for from in pos.pieces_of(us, PieceType::Knight) {
        emit_targets(list, from, knight_attacks(from) & targets);
    }
    for from in pos.pieces_of(us, PieceType::Bishop) {
        emit_targets(list, from, bishop_attacks(from, occ) & targets);
    }
    for from in pos.pieces_of(us, PieceType::Rook) {
        emit_targets(list, from, rook_attacks(from, occ) & targets);
    }
    for from in pos.pieces_of(us, PieceType::Queen) {
        emit_targets(list, from, queen_attacks(from, occ) & targets);
    }
    for from in pos.pieces_of(us, PieceType::King) {
        emit_targets(list, from, king_attacks(from) & targets);
    }
}

/// 取る手を生成（クイーンへの成りを含む）
pub fn generate_captures(pos: &Position, list: &mut MoveList) -> usize {
    let us = pos.side_to_move();
    let enemy = pos.colored(us.opponent());
    let occ = pos.occupied();

    generate_pawn_captures(pos, us, enemy, list);
    generate_pawn_pushes(pos, us, occ, list, PushMode::QueenPromotions);
    generate_piece_moves(pos, us, occ, enemy, list);
    list.len()
}

/// 取らない手を生成（キャスリングは通り道と権利だけを見る）
pub fn generate_quiets(pos: &Position, list: &mut MoveList) -> usize {
    let us = pos.side_to_move();
    let occ = pos.occupied();

    generate_pawn_pushes(pos, us, occ, list, PushMode::QuietPushes);
    generate_piece_moves(pos, us, occ, !occ, list);

    let rights = pos.castling_rights();
    let (oo, ooo, rook, king_from, oo_path, ooo_path, oo_rook, ooo_rook) = match us {
        Color::White => (
            CASTLE_WK,
            CASTLE_WQ,
            Piece::W_ROOK,
            Square::E1,
            WHITE_OO_PATH,
            WHITE_OOO_PATH,
            Square::H1,
            Square::A1,
        ),
        Color::Black => (
            CASTLE_BK,
            CASTLE_BQ,
            Piece::B_ROOK,
            Square::E8,
            BLACK_OO_PATH,
            BLACK_OOO_PATH,
            Square::H8,
            Square::A8,
        ),
    };
    let rooks = pos.pieces(rook);
    if rights & oo != 0 && rooks.contains(oo_rook) && occ.0 & oo_path == 0 {
        list.push(Move::new(king_from, sq_at(king_from.index() + 2), MoveKind::Castle));
    }
    if rights & ooo != 0 && rooks.contains(ooo_rook) && occ.0 & ooo_path == 0 {
        list.push(Move::new(king_from, sq_at(king_from.index() - 2), MoveKind::Castle));
    }
    list.len()
}

/// 取る手と取らない手をまとめて生成
pub fn generate_all(pos: &Position, list: &mut MoveList) -> usize {
    generate_captures(pos, list);
    generate_quiets(pos, list)
}

/// キャスリングが成立するか
///
/// 権利・通り道・ルークの存在に加え、キングの通過する3升に相手の利きがないこと。
pub fn castle_legal(pos: &Position, mv: Move) -> bool {
    let (color, need, rook_from, path, transit) = match (mv.from(), mv.to()) {
        (Square::E1, Square::G1) => (Color::White, CASTLE_WK, Square::H1, WHITE_OO_PATH, Square::F1),
        (Square::E1, Square::C1) => (Color::White, CASTLE_WQ, Square::A1, WHITE_OOO_PATH, Square::D1),
        (Square::E8, Square::G8) => (Color::Black, CASTLE_BK, Square::H8, BLACK_OO_PATH, Square::F8),
        (Square::E8, Square::C8) => (Color::Black, CASTLE_BQ, Square::A8, BLACK_OOO_PATH, Square::D8),
        _ => return false,
    };

    if pos.castling_rights() & need == 0 {
        return false;
    }
    if pos.piece_on(mv.from()) != Some(Piece::new(color, PieceType::King))
        || pos.piece_on(rook_from) != Some(Piece::new(color, PieceType::Rook))
    {
        return false;
    }
    if pos.occupied().0 & path != 0 {
        return false;
    }

    let them = color.opponent();
    !is_square_attacked(pos, mv.from(), them)
        && !is_square_attacked(pos, transit, them)
        && !is_square_attacked(pos, mv.to(), them)
}

/// `sq` に利いている駒（両手番）
pub fn attackers_to(pos: &Position, sq: Square, occ: Bitboard) -> Bitboard {
    let bishops_queens =
        pos.pieces_by_type(PieceType::Bishop) | pos.pieces_by_type(PieceType::Queen);
    let rooks_queens = pos.pieces_by_type(PieceType::Rook) | pos.pieces_by_type(PieceType::Queen);

    (pawn_attacks(Color::White, sq) & pos.pieces(Piece::B_PAWN))
        | (pawn_attacks(Color::Black, sq) & pos.pieces(Piece::W_PAWN))
        | (knight_attacks(sq) & pos.pieces_by_type(PieceType::Knight))
        | (bishop_attacks(sq, occ) & bishops_queens)
        | (rook_attacks(sq, occ) & rooks_queens)
        | (king_attacks(sq) & pos.pieces_by_type(PieceType::King))
}

/// `by` 側の駒が `sq` に利いているか
pub fn is_square_attacked(pos: &Position, sq: Square, by: Color) -> bool {
    let occ = pos.occupied();
    let queens = pos.pieces_of(by, PieceType::Queen);

    (pawn_attacks(by.opponent(), sq) & pos.pieces_of(by, PieceType::Pawn)).is_not_empty()
        || (knight_attacks(sq) & pos.pieces_of(by, PieceType::Knight)).is_not_empty()
        || (king_attacks(sq) & pos.pieces_of(by, PieceType::King)).is_not_empty()
        || (bishop_attacks(sq, occ) & (pos.pieces_of(by, PieceType::Bishop) | queens))
            .is_not_empty()
        || (rook_attacks(sq, occ) & (pos.pieces_of(by, PieceType::Rook) | queens)).is_not_empty()
}

/// `color` のキングに相手の利きがあるか
#[inline]
pub fn king_attacked(pos: &Position, color: Color) -> bool {
    is_square_attacked(pos, pos.king_square(color), color.opponent())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures(pos: &Position) -> Vec<Move> {
        let mut list = MoveList::new();
        generate_captures(pos, &mut list);
        list.iter().collect()
    }

    fn quiets(pos: &Position) -> Vec<Move> {
        let mut list = MoveList::new();
        generate_quiets(pos, &mut list);
        list.iter().collect()
    }

    fn uci(moves: &[Move]) -> Vec<String> {
        moves.iter().map(|m| m.to_uci()).collect()
    }

    #[test]
    fn test_startpos_move_counts() {
        let pos = Position::startpos();
        assert!(captures(&pos).is_empty());
        assert_eq!(quiets(&pos).len(), 20);
    }

    #[test]
    fn test_captures_and_quiets_are_disjoint() {
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let c = captures(&pos);
        let q = quiets(&pos);
        assert_eq!(c.len() + q.len(), 48);
        for m in &c {
            assert!(!q.contains(m), "{m} in both lists");
        }
    }

    #[test]
    fn test_promotion_split() {
        // b7 は前進で成れる、a8 の取りでも成れる
        let pos = Position::from_fen("r3k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let c = uci(&captures(&pos));
        assert_eq!(&c[..5], &["b7a8q", "b7a8r", "b7a8b", "b7a8n", "b7b8q"]);
        let q = uci(&quiets(&pos));
        assert_eq!(&q[..3], &["b7b8r", "b7b8b", "b7b8n"]);
    }

    #[test]
    fn test_en_passant_generated() {
        let pos = Position::from_fen("4k3/8/8/2PpP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let c = uci(&captures(&pos));
        assert_eq!(c, vec!["e5d6", "c5d6"]);
        assert!(captures(&pos).iter().all(|m| m.is_en_passant()));
    }

    #[test]
    fn test_black_pawn_captures() {
        let pos = Position::from_fen("4k3/8/8/8/3p4/2N1N3/8/4K3 b - - 0 1").unwrap();
        let c = uci(&captures(&pos));
        assert_eq!(c, vec!["d4e3", "d4c3"]);
    }

    #[test]
    fn test_castling_generation_and_legality() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let q = quiets(&pos);
        let castles: Vec<_> = q.iter().filter(|m| m.is_castle()).collect();
        assert_eq!(castles.len(), 2);
        for m in castles {
            assert!(castle_legal(&pos, *m));
        }

        // c1 に利きがあるとクイーンサイドは不可（b1 の利きは関係しない）
        let pos = Position::from_fen("2r1k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(!castle_legal(&pos, Move::new(Square::E1, Square::C1, MoveKind::Castle)));
        assert!(castle_legal(&pos, Move::new(Square::E1, Square::G1, MoveKind::Castle)));
        let pos = Position::from_fen("1r2k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(castle_legal(&pos, Move::new(Square::E1, Square::C1, MoveKind::Castle)));

        // 王手中は不可
        let pos = Position::from_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(!castle_legal(&pos, Move::new(Square::E1, Square::G1, MoveKind::Castle)));
    }

    #[test]
    fn test_attack_queries() {
        let pos = Position::from_fen("4k3/8/8/3q4/8/8/8/R3K3 w - - 0 1").unwrap();
        assert!(is_square_attacked(&pos, Square::A8, Color::White));
        assert!(is_square_attacked(&pos, Square::H1, Color::Black));
        assert!(!king_attacked(&pos, Color::White));
        let d5 = Square::parse("d5").unwrap();
        let att = attackers_to(&pos, Square::A8, pos.occupied());
        assert!(att.contains(Square::A1));
        assert!(att.contains(d5));
    }
}
