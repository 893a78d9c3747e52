use crate::models::{
    common::{AgentStatus, DistanceMode, Separation, Vector2},
    error::ModelError,
    traits::{IControlLaw, ITrackable, LawContext},
};
use tracing::trace;

/// デフォルトの時間刻み（秒）
pub const DEFAULT_TIMESTEP: f64 = 0.01;

/// 移動エージェント
///
/// 制御則 `L` から得た速度指令を陽的オイラー法で積分し、位置履歴を追記していきます。
/// 履歴は容量付きの追記専用列で、容量を超える更新は `HistoryExhausted` で即座に失敗します。
#[derive(Debug, Clone)]
pub struct Agent<L> {
    /// エージェントの一意識別子
    pub id: String,
    /// 現在位置
    position: Vector2,
    /// 位置履歴（index = ティック番号、history[0] = 初期位置）
    history: Vec<Vector2>,
    /// 履歴の最大長
    capacity: usize,
    /// 時間刻み（秒）
    timestep: f64,
    /// 直近に適用した速度指令
    last_command: Option<Vector2>,
    pub status: AgentStatus,
    /// 制御則
    law: L,
}

impl<L: IControlLaw> Agent<L> {
    /// 新しいエージェントを作成します
    ///
    /// # 引数
    ///
    /// * `id` - エージェントの一意識別子
    /// * `initial` - 初期位置
    /// * `law` - 制御則
    /// * `timestep` - 時間刻み（`None` の場合は [`DEFAULT_TIMESTEP`]）
    /// * `capacity` - 履歴の最大長（初期位置を含む）
    pub fn new(
        id: String,
        initial: Vector2,
        law: L,
        timestep: Option<f64>,
        capacity: usize,
    ) -> Result<Self, ModelError> {
        let timestep = timestep.unwrap_or(DEFAULT_TIMESTEP);
        if !(timestep.is_finite() && timestep > 0.0) {
            return Err(ModelError::InvalidTimestep(timestep));
        }
        if !initial.is_finite() {
            return Err(ModelError::InvalidPosition { agent_id: id });
        }
        if capacity == 0 {
            return Err(ModelError::InvalidCapacity(capacity));
        }

        let mut history = Vec::with_capacity(capacity.min(4096));
        history.push(initial);

        Ok(Self {
            id,
            position: initial,
            history,
            capacity,
            timestep,
            last_command: None,
            status: AgentStatus::Active,
            law,
        })
    }

    /// 1ティック分の状態更新
    ///
    /// 制御則が `None` を返した場合や凍結中の場合は何も変更せず `Ok(false)` を返します。
    /// それ以外は `position += timestep * command` で更新し、履歴へ追記して `Ok(true)` を返します。
    pub fn advance(&mut self, t: f64, target: Option<Vector2>) -> Result<bool, ModelError> {
        if self.status == AgentStatus::Frozen {
            return Ok(false);
        }

        let ctx = LawContext {
            position: self.position,
            timestep: self.timestep,
            target,
        };
        let Some(command) = self.law.control_law(t, &ctx) else {
            return Ok(false);
        };
        self.ensure_room()?;

        self.position += command * self.timestep;
        self.history.push(self.position);
        self.last_command = Some(command);

        trace!(
            agent_id = %self.id,
            tick = self.history.len(),
            t = t,
            x = self.position.x,
            y = self.position.y,
            "AGENT_ADVANCED"
        );

        Ok(true)
    }

    /// 履歴にもう1点追記できるかを確認します（凍結中は常に成功）
    pub fn ensure_room(&self) -> Result<(), ModelError> {
        if self.status == AgentStatus::Active && self.history.len() >= self.capacity {
            return Err(ModelError::HistoryExhausted {
                agent_id: self.id.clone(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// 以降の `advance` を無効化（履歴は保持）
    pub fn freeze(&mut self) {
        self.status = AgentStatus::Frozen;
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// 他点との離隔（スカラー距離または成分ごとの変位 `other - self`）
    pub fn distance_to(&self, other: Vector2, mode: DistanceMode) -> Separation {
        match mode {
            DistanceMode::Scalar => Separation::Scalar(self.position.distance(&other)),
            DistanceMode::Components => Separation::Components(other - self.position),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn law(&self) -> &L {
        &self.law
    }

    pub fn law_mut(&mut self) -> &mut L {
        &mut self.law
    }
}

impl<L> ITrackable for Agent<L> {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn current_position(&self) -> Vector2 {
        self.position
    }

    fn trajectory(&self) -> &[Vector2] {
        &self.history
    }

    fn tick(&self) -> usize {
        self.history.len()
    }

    fn timestep(&self) -> f64 {
        self.timestep
    }

    fn last_command(&self) -> Option<Vector2> {
        self.last_command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 一定速度を返す制御則
    #[derive(Debug)]
    struct Constant(Vector2);

    impl IControlLaw for Constant {
        fn control_law(&mut self, _t: f64, _ctx: &LawContext) -> Option<Vector2> {
            Some(self.0)
        }
    }

    /// 常に「更新なし」を返す制御則
    #[derive(Debug)]
    struct Idle;

    impl IControlLaw for Idle {
        fn control_law(&mut self, _t: f64, _ctx: &LawContext) -> Option<Vector2> {
            None
        }
    }

    #[test]
    fn test_advance_integrates_and_records_history() {
        let mut agent = Agent::new("A".to_string(), Vector2::new(1.0, 1.0), Constant(Vector2::new(2.0, -1.0)), None, 16).unwrap();
        assert_eq!(agent.tick(), 1);
        assert_eq!(agent.trajectory(), &[Vector2::new(1.0, 1.0)]);

        for k in 0..3 {
            assert!(agent.advance(k as f64 * 0.01, None).unwrap());
            assert_eq!(agent.trajectory().len(), agent.tick());
            assert_eq!(agent.current_position(), agent.trajectory()[agent.tick() - 1]);
        }

        assert_eq!(agent.tick(), 4);
        let p = agent.current_position();
        assert!((p.x - 1.06).abs() < 1e-12);
        assert!((p.y - 0.97).abs() < 1e-12);
        assert_eq!(agent.last_command(), Some(Vector2::new(2.0, -1.0)));
    }

    #[test]
    fn test_no_update_sentinel_is_noop() {
        let mut agent = Agent::new("A".to_string(), Vector2::ZERO, Idle, None, 4).unwrap();
        assert!(!agent.advance(0.0, None).unwrap());
        assert_eq!(agent.tick(), 1);
        assert_eq!(agent.current_position(), Vector2::ZERO);
        assert_eq!(agent.last_command(), None);
    }

    #[test]
    fn test_frozen_agent_does_not_move() {
        let mut agent = Agent::new("A".to_string(), Vector2::ZERO, Constant(Vector2::new(1.0, 0.0)), None, 8).unwrap();
        agent.advance(0.0, None).unwrap();
        agent.freeze();
        assert!(!agent.advance(0.01, None).unwrap());
        assert_eq!(agent.tick(), 2);
        assert_eq!(agent.trajectory().len(), 2);
    }

    #[test]
    fn test_history_exhaustion_fails_fast() {
        let mut agent = Agent::new("A".to_string(), Vector2::ZERO, Constant(Vector2::new(1.0, 0.0)), None, 3).unwrap();
        agent.advance(0.0, None).unwrap();
        agent.advance(0.01, None).unwrap();
        let err = agent.advance(0.02, None).unwrap_err();
        assert_eq!(err, ModelError::HistoryExhausted { agent_id: "A".to_string(), capacity: 3 });
        assert_eq!(agent.tick(), 3);
        assert!(agent.ensure_room().is_err());
    }

    #[test]
    fn test_full_history_with_no_update_is_noop() {
        let mut agent = Agent::new("A".to_string(), Vector2::new(2.0, 3.0), Idle, None, 1).unwrap();
        assert!(agent.ensure_room().is_err());
        assert!(!agent.advance(0.0, None).unwrap());
        assert_eq!(agent.tick(), 1);
        assert_eq!(agent.current_position(), Vector2::new(2.0, 3.0));
    }

    #[test]
    fn test_frozen_full_agent_has_room() {
        let mut agent = Agent::new("A".to_string(), Vector2::ZERO, Constant(Vector2::new(1.0, 0.0)), None, 1).unwrap();
        agent.freeze();
        assert!(agent.ensure_room().is_ok());
        assert!(!agent.advance(0.0, None).unwrap());
    }

    #[test]
    fn test_invalid_construction_is_rejected() {
        let law = || Constant(Vector2::ZERO);
        assert_eq!(
            Agent::new("A".to_string(), Vector2::ZERO, law(), Some(0.0), 4).unwrap_err(),
            ModelError::InvalidTimestep(0.0)
        );
        assert!(Agent::new("A".to_string(), Vector2::ZERO, law(), Some(-0.01), 4).is_err());
        assert!(Agent::new("A".to_string(), Vector2::ZERO, law(), Some(f64::NAN), 4).is_err());
        assert!(Agent::new("A".to_string(), Vector2::new(f64::INFINITY, 0.0), law(), None, 4).is_err());
        assert_eq!(
            Agent::new("A".to_string(), Vector2::ZERO, law(), None, 0).unwrap_err(),
            ModelError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_distance_modes() {
        let agent = Agent::new("A".to_string(), Vector2::new(3.0, 4.0), Idle, None, 2).unwrap();
        assert_eq!(agent.distance_to(Vector2::ZERO, DistanceMode::Scalar), Separation::Scalar(5.0));
        assert_eq!(
            agent.distance_to(Vector2::ZERO, DistanceMode::Components),
            Separation::Components(Vector2::new(-3.0, -4.0))
        );
    }
}
