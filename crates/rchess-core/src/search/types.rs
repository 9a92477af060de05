//! 探索で使う型
//!
//! - `NodeType`: ノード種別（const generic の引数）
//! - `Stack`: ply ごとの探索スタック
//! - `SearchLimits` / `SearchResult` / `SearchInfo`: 探索の入出力

use crate::types::{MAX_PLY, Move, Piece, Square, Value};

/// ノード種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// ルート
    Root = 0,
    /// PV ノード（全窓）
    PV = 1,
    /// 非 PV ノード（null window）
    NonPV = 2,
}

/// PV 長の上限
pub const MAX_PV: usize = MAX_PLY as usize + 1;

/// スタックの長さ（`ply + 2` まで触るため余裕を持たせる）
pub const STACK_SIZE: usize = MAX_PLY as usize + 8;

/// 1 ply 分の探索スタック
#[derive(Clone)]
pub struct Stack {
    pub pv: [Move; MAX_PV],
    pub pv_len: usize,
    pub in_check: bool,
    pub static_eval: Value,
    /// この ply で指した手（null move なら `Move::NONE`）
    pub current_move: Move,
    /// 直前の手が null move か
    pub null_move: bool,
    pub killer: Move,
    /// singular extension の検証探索で除外する手
    pub excluded_move: Move,
    pub reduction: i32,
    /// 動かした駒と移動先（ContinuationHistory / カウンター手のキー）
    pub moved: Option<(Piece, Square)>,
}

impl Default for Stack {
    fn default() -> Self {
        Self {
            pv: [Move::NONE; MAX_PV],
            pv_len: 0,
            in_check: false,
            static_eval: Value::NONE,
            current_move: Move::NONE,
            null_move: false,
            killer: Move::NONE,
            excluded_move: Move::NONE,
            reduction: 0,
            moved: None,
        }
    }
}

impl Stack {
    /// 反復深化の各回の開始時に戻す
    pub fn reset(&mut self) {
        self.pv_len = 0;
        self.in_check = false;
        self.static_eval = Value::NONE;
        self.current_move = Move::NONE;
        self.null_move = false;
        self.killer = Move::NONE;
        self.excluded_move = Move::NONE;
        self.reduction = 0;
        self.moved = None;
    }
}

/// ヒープ上に確保した `STACK_SIZE` 個のスタック
pub type StackArray = Box<[Stack]>;

pub fn new_stack_array() -> StackArray {
    (0..STACK_SIZE).map(|_| Stack::default()).collect()
}

/// 探索の制限
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// 固定深さ（None なら時間で打ち切る）
    pub depth: Option<i32>,
    /// この時間を過ぎたら次の反復に入らない（ms）
    pub soft_ms: Option<u64>,
    /// この時間を過ぎたら探索を中断する（ms）
    pub hard_ms: Option<u64>,
    /// ノード数の上限
    pub nodes: Option<u64>,
}

impl SearchLimits {
    pub fn depth(depth: i32) -> Self {
        Self { depth: Some(depth), ..Default::default() }
    }
}

/// 反復深化1回ごとの報告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: i32,
    pub sel_depth: i32,
    pub nodes: u64,
    pub nps: u64,
    pub hashfull: i32,
    pub score: Value,
    pub elapsed_ms: u64,
    pub pv: Vec<Move>,
}

/// 探索結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// 最善手（合法手がなければ `Move::NONE`）
    pub best_move: Move,
    pub score_cp: i32,
    pub pv: Vec<Move>,
    /// 完了した深さ
    pub depth: i32,
    pub nodes: u64,
}

impl SearchResult {
    pub fn ponder_move(&self) -> Option<Move> {
        self.pv.get(1).copied()
    }
}
