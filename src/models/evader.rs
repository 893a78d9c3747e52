use crate::models::{
    agent::Agent,
    common::Vector2,
    error::ModelError,
    traits::{IControlLaw, LawContext},
};

/// 逃避側エージェント
pub type Evader = Agent<EvaderLaw>;

/// 逃避側の運動則
///
/// 開ループの時間関数であり、いかなるエージェントの位置にも依存しません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvaderLaw {
    /// `vx` 一定、`vy = amplitude * cos(omega * t)` の高速振動を伴うドリフト
    Oscillating { vx: f64, amplitude: f64, omega: f64 },
    /// 静止（速度0）
    Stationary,
}

impl Default for EvaderLaw {
    fn default() -> Self {
        EvaderLaw::Oscillating {
            vx: 1.0,
            amplitude: 2.0,
            omega: 1000.0,
        }
    }
}

impl EvaderLaw {
    /// 時刻 `t` における速度
    pub fn velocity_at(&self, t: f64) -> Vector2 {
        match *self {
            EvaderLaw::Oscillating { vx, amplitude, omega } => {
                Vector2::new(vx, amplitude * (omega * t).cos())
            }
            EvaderLaw::Stationary => Vector2::ZERO,
        }
    }
}

impl IControlLaw for EvaderLaw {
    fn control_law(&mut self, t: f64, _ctx: &LawContext) -> Option<Vector2> {
        Some(self.velocity_at(t))
    }
}

impl Agent<EvaderLaw> {
    /// 新しい逃避側エージェントを作成します
    ///
    /// # 引数
    ///
    /// * `id` - エージェントID
    /// * `initial` - 初期位置
    /// * `law` - 運動則
    /// * `timestep` - 時間刻みの上書き
    /// * `capacity` - 履歴容量
    pub fn spawn(
        id: String,
        initial: Vector2,
        law: EvaderLaw,
        timestep: Option<f64>,
        capacity: usize,
    ) -> Result<Self, ModelError> {
        Agent::new(id, initial, law, timestep, capacity)
    }
}
