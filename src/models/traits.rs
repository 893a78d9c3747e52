use crate::models::common::*;

/// 制御則の評価に渡される入力
///
/// エージェント自身の現在位置と時間刻み、および観測している目標位置（存在する場合）を保持します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LawContext {
    /// 自機の現在位置
    pub position: Vector2,
    /// 自機の時間刻み（秒）
    pub timestep: f64,
    /// 観測中の目標の現在位置
    pub target: Option<Vector2>,
}

/// 全ての移動エージェントが実装する制御則インターフェース
pub trait IControlLaw {
    /// 時刻 `t` における速度指令を返す
    ///
    /// `None` は「更新なし」を意味し、エージェントの状態は一切変化しません。
    fn control_law(&mut self, t: f64, ctx: &LawContext) -> Option<Vector2>;
}

/// 表示層から参照される読み取り専用インターフェース
pub trait ITrackable {
    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// 現在位置の取得
    fn current_position(&self) -> Vector2;

    /// 初期位置から現在位置までの全履歴
    fn trajectory(&self) -> &[Vector2];

    /// 記録済み位置数（初期位置を含む）
    fn tick(&self) -> usize;

    /// 時間刻みの取得
    fn timestep(&self) -> f64;

    /// 直近に適用した速度指令
    fn last_command(&self) -> Option<Vector2>;
}
