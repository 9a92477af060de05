//! 探索チューニングパラメータ（SPSA向け）
//!
//! UCI `setoption` で更新できる探索係数を集約する。
//! 小数の係数は 100 倍した整数で持つ（`LMRBase100 = 77` なら 0.77）。

use serde::{Deserialize, Serialize};

/// 1つのチューニング項目の定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTuneOptionSpec {
    /// UCI option 名
    pub name: &'static str,
    /// デフォルト値
    pub default: i32,
    /// 最小値（inclusive）
    pub min: i32,
    /// 最大値（inclusive）
    pub max: i32,
}

/// `setoption` で1項目を適用した結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTuneSetResult {
    /// 反映後の値（必要なら clamp 後）
    pub applied: i32,
    /// 入力値が範囲外で clamp されたか
    pub clamped: bool,
    pub min: i32,
    pub max: i32,
}

/// 探索係数の集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTuneParams {
    /// LMR: 基本量（×100）
    pub lmr_base_100: i32,
    /// LMR: `ln(depth)·ln(move_index)` の除数（×100）
    pub lmr_divisor_100: i32,

    /// Reverse futility: 適用する最大深さ
    pub rfp_max_depth: i32,
    /// Reverse futility: 1手あたりのマージン
    pub rfp_margin_per_depth: i32,

    /// Futility: 適用する最大深さ
    pub futility_max_depth: i32,
    /// Futility: 1手あたりのマージン
    pub futility_margin_per_depth: i32,

    /// 静止探索で残す取りの SEE 下限
    pub qsee_margin: i32,

    /// NMP: 基本削減量
    pub nmp_base: i32,
    /// NMP: 深さに掛ける係数（×100）
    pub nmp_depth_scale_100: i32,
    /// NMP: `(eval - beta)` の除数
    pub nmp_eval_margin: i32,
    /// NMP: eval 由来の追加削減の上限
    pub nmp_eval_max: i32,

    /// quiet の SEE 枝刈り: 1手あたりのマージン
    pub lmp_margin_per_depth: i32,
    /// LMP: 適用する最大深さ
    pub lmp_max_depth: i32,
    /// LMP: 残す手数の基本値
    pub lmp_base_threshold: i32,
    /// LMP: `depth²` に掛ける係数
    pub lmp_per_depth: i32,

    /// IIR: PV ノードで適用する最小深さ
    pub iir_min_pv_depth: i32,
    /// IIR: cut ノードで適用する最小深さ
    pub iir_min_cut_depth: i32,

    /// Singular extension: 適用する最小深さ
    pub se_min_depth: i32,
    /// Singular extension: `tt_score` から引くマージン（`·depth/8`）
    pub se_margin: i32,
    /// Singular extension: 検証探索の深さ係数（×100）
    pub se_depth_scale_100: i32,
}

impl Default for SearchTuneParams {
    fn default() -> Self {
        Self {
            lmr_base_100: 77,
            lmr_divisor_100: 216,
            rfp_max_depth: 3,
            rfp_margin_per_depth: 111,
            futility_max_depth: 2,
            futility_margin_per_depth: 110,
            qsee_margin: -7,
            nmp_base: 2,
            nmp_depth_scale_100: 23,
            nmp_eval_margin: 241,
            nmp_eval_max: 4,
            lmp_margin_per_depth: 129,
            lmp_max_depth: 3,
            lmp_base_threshold: 4,
            lmp_per_depth: 1,
            iir_min_pv_depth: 2,
            iir_min_cut_depth: 3,
            se_min_depth: 8,
            se_margin: 16,
            se_depth_scale_100: 50,
        }
    }
}

const SPSA_OPTION_SPECS: &[SearchTuneOptionSpec] = &[
    SearchTuneOptionSpec { name: "LMRBase100", default: 77, min: 0, max: 300 },
    SearchTuneOptionSpec { name: "LMRDivisor100", default: 216, min: 1, max: 1000 },
    SearchTuneOptionSpec { name: "ReverseFUTMaxDepth", default: 3, min: 0, max: 8 },
    SearchTuneOptionSpec { name: "ReverseFUTMarginPerDepth", default: 111, min: 0, max: 1024 },
    SearchTuneOptionSpec { name: "FUTMaxDepth", default: 2, min: 0, max: 8 },
    SearchTuneOptionSpec { name: "FUTMarginPerDepth", default: 110, min: 0, max: 1024 },
    SearchTuneOptionSpec { name: "QSeeMargin", default: -7, min: -1024, max: 1024 },
    SearchTuneOptionSpec { name: "NMPBase", default: 2, min: 0, max: 10 },
    SearchTuneOptionSpec { name: "NMPDepthScale100", default: 23, min: 0, max: 200 },
    SearchTuneOptionSpec { name: "NMPEvalMargin", default: 241, min: 1, max: 4000 },
    SearchTuneOptionSpec { name: "NMPEvalMax", default: 4, min: 0, max: 10 },
    SearchTuneOptionSpec { name: "LMPMarginPerDepth", default: 129, min: 0, max: 1024 },
    SearchTuneOptionSpec { name: "LMPMaxDepth", default: 3, min: 0, max: 8 },
    SearchTuneOptionSpec { name: "LMPBaseThreshold", default: 4, min: 0, max: 64 },
    SearchTuneOptionSpec { name: "LMPPerDepth", default: 1, min: 0, max: 16 },
    SearchTuneOptionSpec { name: "IIRMinPVDepth", default: 2, min: 0, max: 16 },
    SearchTuneOptionSpec { name: "IIRMinCutDepth", default: 3, min: 0, max: 16 },
    SearchTuneOptionSpec { name: "SEMinDepth", default: 8, min: 4, max: 16 },
    SearchTuneOptionSpec { name: "SEMargin", default: 16, min: 4, max: 64 },
    SearchTuneOptionSpec { name: "SEDepthScale100", default: 50, min: 10, max: 100 },
];

impl SearchTuneParams {
    /// UCI に公開するチューニング項目の一覧
    pub fn option_specs() -> &'static [SearchTuneOptionSpec] {
        SPSA_OPTION_SPECS
    }

    /// UCI option 名で1項目を更新する
    ///
    /// 未知の名前なら `None`。値は定義範囲に clamp して反映する。
    pub fn set_from_name(&mut self, name: &str, value: i32) -> Option<SearchTuneSetResult> {
        fn apply(dst: &mut i32, value: i32, min: i32, max: i32) -> SearchTuneSetResult {
            let applied = value.clamp(min, max);
            *dst = applied;
            SearchTuneSetResult {
                applied,
                clamped: applied != value,
                min,
                max,
            }
        }

        let spec = SPSA_OPTION_SPECS.iter().find(|s| s.name == name.trim())?;
        let dst = self.field_mut(spec.name)?;
        Some(apply(dst, value, spec.min, spec.max))
    }

    /// 現在値を UCI option 名で取得
    pub fn get_by_name(&self, name: &str) -> Option<i32> {
        let mut copy = *self;
        copy.field_mut(name).map(|v| *v)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut i32> {
        let field = match name {
            "LMRBase100" => &mut self.lmr_base_100,
            "LMRDivisor100" => &mut self.lmr_divisor_100,
            "ReverseFUTMaxDepth" => &mut self.rfp_max_depth,
            "ReverseFUTMarginPerDepth" => &mut self.rfp_margin_per_depth,
            "FUTMaxDepth" => &mut self.futility_max_depth,
            "FUTMarginPerDepth" => &mut self.futility_margin_per_depth,
            "QSeeMargin" => &mut self.qsee_margin,
            "NMPBase" => &mut self.nmp_base,
            "NMPDepthScale100" => &mut self.nmp_depth_scale_100,
            "NMPEvalMargin" => &mut self.nmp_eval_margin,
            "NMPEvalMax" => &mut self.nmp_eval_max,
            "LMPMarginPerDepth" => &mut self.lmp_margin_per_depth,
            "LMPMaxDepth" => &mut self.lmp_max_depth,
            "LMPBaseThreshold" => &mut self.lmp_base_threshold,
            "LMPPerDepth" => &mut self.lmp_per_depth,
            "IIRMinPVDepth" => &mut self.iir_min_pv_depth,
            "IIRMinCutDepth" => &mut self.iir_min_cut_depth,
            "SEMinDepth" => &mut self.se_min_depth,
            "SEMargin" => &mut self.se_margin,
            "SEDepthScale100" => &mut self.se_depth_scale_100,
            _ => return None,
        };
        Some(field)
    }

    #[inline]
    pub fn lmr_base(&self) -> f64 {
        self.lmr_base_100 as f64 / 100.0
    }

    #[inline]
    pub fn lmr_divisor(&self) -> f64 {
        (self.lmr_divisor_100 as f64 / 100.0).max(0.01)
    }

    #[inline]
    pub fn nmp_depth_scale(&self) -> f64 {
        self.nmp_depth_scale_100 as f64 / 100.0
    }

    #[inline]
    pub fn se_depth_scale(&self) -> f64 {
        self.se_depth_scale_100 as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_specs() {
        let defaults = SearchTuneParams::default();
        for spec in SearchTuneParams::option_specs() {
            assert_eq!(defaults.get_by_name(spec.name), Some(spec.default), "{}", spec.name);
            let mut params = defaults;
            let res = params.set_from_name(spec.name, spec.default).expect("spec must be mappable");
            assert_eq!(res.applied, spec.default);
            assert!(!res.clamped);
            assert_eq!(params, defaults);
        }
    }

    #[test]
    fn clamp_is_reported() {
        let mut params = SearchTuneParams::default();
        let res = params.set_from_name("NMPEvalMargin", 0).expect("known name");
        assert!(res.clamped);
        assert_eq!(res.applied, 1);
        assert_eq!(params.nmp_eval_margin, 1);
    }

    #[test]
    fn negative_margin_is_accepted() {
        let mut params = SearchTuneParams::default();
        let res = params.set_from_name("QSeeMargin", -100).expect("known name");
        assert!(!res.clamped);
        assert_eq!(params.qsee_margin, -100);
    }

    #[test]
    fn all_specs_support_min_max_clamp() {
        let defaults = SearchTuneParams::default();
        for spec in SearchTuneParams::option_specs() {
            let mut params = defaults;
            let low = params.set_from_name(spec.name, spec.min - 1).expect("spec must be mappable");
            assert_eq!(low.applied, spec.min);
            assert!(low.clamped);

            let high = params.set_from_name(spec.name, spec.max + 1).expect("spec must be mappable");
            assert_eq!(high.applied, spec.max);
            assert!(high.clamped);
        }
    }

    #[test]
    fn unknown_name_is_none() {
        let mut params = SearchTuneParams::default();
        assert!(params.set_from_name("Hash", 64).is_none());
        assert_eq!(params, SearchTuneParams::default());
    }

    #[test]
    fn scaled_knobs() {
        let params = SearchTuneParams::default();
        assert!((params.lmr_base() - 0.77).abs() < 1e-9);
        assert!((params.lmr_divisor() - 2.16).abs() < 1e-9);
        assert!((params.se_depth_scale() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn json_roundtrip_and_partial_input() {
        let mut params = SearchTuneParams::default();
        params.se_margin = 20;
        let json = serde_json::to_string(&params).unwrap();
        let back: SearchTuneParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        // 欠けた項目はデフォルト値になる
        let partial: SearchTuneParams = serde_json::from_str(r#"{"nmp_base": 3}"#).unwrap();
        assert_eq!(partial.nmp_base, 3);
        assert_eq!(partial.lmr_base_100, 77);
    }
}
