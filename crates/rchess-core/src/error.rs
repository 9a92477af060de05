//! エラー型
//!
//! FEN 解析・ネットワーク読み込み・利きテーブル読み込みの失敗を表す。

/// FEN 解析エラー
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("FEN must have at least 4 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid piece character '{0}'")]
    BadPiece(char),

    #[error("invalid board layout: {0}")]
    BadBoard(String),

    #[error("invalid side to move '{0}'")]
    BadSide(String),

    #[error("invalid castling field '{0}'")]
    BadCastling(String),

    #[error("invalid en passant field '{0}'")]
    BadEnPassant(String),

    #[error("invalid move counter '{0}'")]
    BadCounter(String),

    #[error("{0:?} king is missing or duplicated")]
    KingCount(crate::types::Color),
}

/// NNUE ネットワーク読み込みエラー
#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("network size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// 利きテーブル読み込みエラー
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("slider table size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("slider table is already initialized")]
    AlreadyInitialized,
}

/// クレート全体のエラー
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = PositionError::BadPiece('x');
        assert_eq!(e.to_string(), "invalid piece character 'x'");

        let e: Error = NetworkError::SizeMismatch {
            expected: 10,
            actual: 4,
        }
        .into();
        assert!(e.to_string().contains("expected 10"));
    }
}
