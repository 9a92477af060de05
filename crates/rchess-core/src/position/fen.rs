//! FEN 形式の解析・出力

use super::pos::{
    CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, CR_SHIFT, EP_NONE, EP_SHIFT, FM_MAX, FM_SHIFT,
    HC_MAX, HC_SHIFT, Position,
};
use crate::bitboard::pawn_attacks;
use crate::error::PositionError;
use crate::types::{Color, Piece, PieceType, Square};

/// 平手初期局面
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// 初期局面
    ///
    /// `STARTPOS_FEN` と同じ局面を解析を通さずに組み立てる。
    pub fn startpos() -> Position {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut pos = Position::empty();
        for (file, back) in (0u8..).zip(BACK_RANK) {
            let squares = [
                (Color::White, back, 0),
                (Color::White, PieceType::Pawn, 1),
                (Color::Black, PieceType::Pawn, 6),
                (Color::Black, back, 7),
            ];
            for (color, pt, rank) in squares {
                if let Some(sq) = Square::from_file_rank(file, rank) {
                    pos.put_piece(Piece::new(color, pt), sq);
                }
            }
        }

        pos.meta = Color::White.index() as u32
            | ((CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ) as u32) << CR_SHIFT
            | EP_NONE << EP_SHIFT;
        pos.key = pos.compute_key();
        pos.history.push(pos.key);
        pos
    }

    /// FEN 文字列から局面を生成
    ///
    /// 手数フィールド（5, 6番目）は省略可能で、省略時は 0 と 1。
    /// アンパッサン升は、実際に取れるポーンがいるときだけ保持する。
    pub fn from_fen(fen: &str) -> Result<Position, PositionError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(PositionError::FieldCount(fields.len()));
        }

        let mut pos = Position::empty();
        parse_board(&mut pos, fields[0])?;

        for color in [Color::White, Color::Black] {
            if pos.pieces_of(color, PieceType::King).count() != 1 {
                return Err(PositionError::KingCount(color));
            }
        }

        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            s => return Err(PositionError::BadSide(s.to_string())),
        };

        let rights = parse_castling(fields[2])?;
        let ep = parse_en_passant(&pos, fields[3], side)?;

        let hc = match fields.get(4) {
            Some(s) => parse_counter(s)?,
            None => 0,
        };
        let fm = match fields.get(5) {
            Some(s) => parse_counter(s)?,
            None => 1,
        };

        pos.meta = side.index() as u32
            | (rights as u32) << CR_SHIFT
            | ep.map_or(EP_NONE, |sq| sq.index() as u32) << EP_SHIFT
            | hc.min(HC_MAX) << HC_SHIFT
            | fm.saturating_sub(1).min(FM_MAX) << FM_SHIFT;

        pos.key = pos.compute_key();
        pos.history.push(pos.key);
        Ok(pos)
    }

    /// FEN 文字列に変換
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match Square::from_file_rank(file, rank).and_then(|sq| self.piece_on(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push_str(match self.side_to_move() {
            Color::White => " w ",
            Color::Black => " b ",
        });

        let cr = self.castling_rights();
        if cr == 0 {
            fen.push('-');
        } else {
            for (bit, c) in [(CASTLE_WK, 'K'), (CASTLE_WQ, 'Q'), (CASTLE_BK, 'k'), (CASTLE_BQ, 'q')] {
                if cr & bit != 0 {
                    fen.push(c);
                }
            }
        }

        fen.push(' ');
        match self.ep_square() {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock(), self.fullmove_number()));
        fen
    }
}

fn parse_board(pos: &mut Position, board: &str) -> Result<(), PositionError> {
    let ranks: Vec<&str> = board.split('/').collect();
    if ranks.len() != 8 {
        return Err(PositionError::BadBoard(format!("expected 8 ranks, got {}", ranks.len())));
    }

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(d) = c.to_digit(10) {
                if !(1..=8).contains(&d) {
                    return Err(PositionError::BadBoard(format!("bad empty count '{c}'")));
                }
                file += d as u8;
                continue;
            }
            let piece = Piece::from_char(c).ok_or(PositionError::BadPiece(c))?;
            let sq = Square::from_file_rank(file, rank)
                .ok_or_else(|| PositionError::BadBoard(format!("rank {} overflows", rank + 1)))?;
            pos.put_piece(piece, sq);
            file += 1;
        }
        if file != 8 {
            return Err(PositionError::BadBoard(format!(
                "rank {} has {} files",
                rank + 1,
                file
            )));
        }
    }
    Ok(())
}

fn parse_castling(s: &str) -> Result<u8, PositionError> {
    if s == "-" {
        return Ok(0);
    }
    let mut rights = 0u8;
    for c in s.chars() {
        rights |= match c {
            'K' => CASTLE_WK,
            'Q' => CASTLE_WQ,
            'k' => CASTLE_BK,
            'q' => CASTLE_BQ,
            _ => return Err(PositionError::BadCastling(s.to_string())),
        };
    }
    Ok(rights)
}

/// 取れるポーンがいなければ None（エラーにはしない）
fn parse_en_passant(pos: &Position, s: &str, side: Color) -> Result<Option<Square>, PositionError> {
    if s == "-" {
        return Ok(None);
    }
    let sq = Square::parse(s).ok_or_else(|| PositionError::BadEnPassant(s.to_string()))?;
    let expected_rank = match side {
        Color::White => 5,
        Color::Black => 2,
    };
    if sq.rank() != expected_rank {
        return Ok(None);
    }
    // EP 升から相手側に向けたポーンの利き = EP を取れるポーンの位置
    let capturers = pawn_attacks(side.opponent(), sq) & pos.pieces_of(side, PieceType::Pawn);
    Ok(if capturers.is_not_empty() { Some(sq) } else { None })
}

fn parse_counter(s: &str) -> Result<u32, PositionError> {
    s.parse::<u32>().map_err(|_| PositionError::BadCounter(s.to_string()))
}
