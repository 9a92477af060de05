//! 置換表の境界種別（Bound）

/// 評価値の境界
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Bound {
    #[default]
    None = 0,
    /// 下界（fail-high）
    Lower = 1,
    /// 上界（fail-low）
    Upper = 2,
    /// 正確な値
    Exact = 3,
}

impl Bound {
    /// 2bit 値から生成
    #[inline]
    pub const fn from_u8(v: u8) -> Bound {
        match v & 3 {
            0 => Bound::None,
            1 => Bound::Lower,
            2 => Bound::Upper,
            _ => Bound::Exact,
        }
    }

    /// 下界を含むか（Lower / Exact）
    #[inline]
    pub const fn is_lower_or_exact(self) -> bool {
        (self as u8) & 1 != 0
    }

    /// 上界を含むか（Upper / Exact）
    #[inline]
    pub const fn is_upper_or_exact(self) -> bool {
        (self as u8) & 2 != 0
    }
}
