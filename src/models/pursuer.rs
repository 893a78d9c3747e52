use crate::models::{
    agent::Agent,
    common::Vector2,
    error::ModelError,
    traits::{IControlLaw, LawContext},
};
use tracing::debug;

/// 追跡側エージェント
pub type Pursuer = Agent<PursuitLaw>;

/// PIDゲインとリミット
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// 比例ゲイン
    pub kp: f64,
    /// 積分ゲイン
    pub ki: f64,
    /// 微分ゲイン
    pub kd: f64,
    /// 積分器の成分ごとの上限（アンチワインドアップ）
    pub integral_limit: f64,
    /// 出力指令の成分ごとの上限（アクチュエータ飽和）
    pub actuator_limit: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 4.0,
            ki: 1.5,
            kd: 0.075,
            integral_limit: 20.0,
            actuator_limit: 25.0,
        }
    }
}

impl PidGains {
    /// ゲインは非負の有限値、リミットは正の有限値であることを検証
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ModelError::InvalidGain { name, value });
            }
        }
        for (name, value) in [
            ("integral_limit", self.integral_limit),
            ("actuator_limit", self.actuator_limit),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ModelError::InvalidLimit { name, value });
            }
        }
        Ok(())
    }
}

/// 1ティック分のPID計算結果
///
/// `raw` は飽和前の P + I + D、`command` は飽和後の指令です。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidBreakdown {
    pub error: Vector2,
    pub p: Vector2,
    pub i: Vector2,
    pub d: Vector2,
    pub raw: Vector2,
    pub command: Vector2,
}

/// 2軸独立のPID制御器
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral: Vector2,
    previous_error: Vector2,
    last: PidBreakdown,
}

impl PidController {
    pub fn new(gains: PidGains) -> Result<Self, ModelError> {
        gains.validate()?;
        Ok(Self {
            gains,
            integral: Vector2::ZERO,
            previous_error: Vector2::ZERO,
            last: PidBreakdown::default(),
        })
    }

    /// 同一の誤差サンプル `error` から P, I, D を計算し、飽和後の指令を返す
    pub fn compute(&mut self, error: Vector2, dt: f64) -> Vector2 {
        let g = self.gains;

        let p = error * g.kp;

        self.integral = (self.integral + error * dt).clamp_components(g.integral_limit);
        let i = self.integral * g.ki;

        let d = (error - self.previous_error) / dt * g.kd;
        self.previous_error = error;

        let raw = p + i + d;
        let command = raw.clamp_components(g.actuator_limit);

        self.last = PidBreakdown {
            error,
            p,
            i,
            d,
            raw,
            command,
        };
        command
    }

    /// 直近の計算結果（内部状態は変更しない）
    pub fn breakdown(&self) -> PidBreakdown {
        self.last
    }

    pub fn integral(&self) -> Vector2 {
        self.integral
    }

    pub fn previous_error(&self) -> Vector2 {
        self.previous_error
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// 積分器と微分メモリを初期化
    pub fn reset(&mut self) {
        self.integral = Vector2::ZERO;
        self.previous_error = Vector2::ZERO;
        self.last = PidBreakdown::default();
    }
}

/// 追跡側の制御則
///
/// 目標位置が与えられない場合は「更新なし」を返します。
#[derive(Debug, Clone)]
pub struct PursuitLaw {
    /// 追跡対象のID
    pub target_id: String,
    pub controller: PidController,
}

impl IControlLaw for PursuitLaw {
    fn control_law(&mut self, t: f64, ctx: &LawContext) -> Option<Vector2> {
        let target = ctx.target?;
        let error = target - ctx.position;
        let command = self.controller.compute(error, ctx.timestep);

        let b = self.controller.breakdown();
        if b.raw != b.command {
            debug!(
                target_id = %self.target_id,
                t = t,
                raw_x = b.raw.x,
                raw_y = b.raw.y,
                command_x = b.command.x,
                command_y = b.command.y,
                "PURSUER_SATURATED: 制御指令がアクチュエータ上限で飽和しました"
            );
        }

        Some(command)
    }
}

impl Agent<PursuitLaw> {
    /// 新しい追跡側エージェントを作成します
    ///
    /// # 引数
    ///
    /// * `id` - エージェントID
    /// * `initial` - 初期位置
    /// * `target_id` - 追跡対象（逃避側）のID
    /// * `gains` - PIDゲイン
    /// * `timestep` - 時間刻みの上書き
    /// * `capacity` - 履歴容量
    pub fn spawn(
        id: String,
        initial: Vector2,
        target_id: String,
        gains: PidGains,
        timestep: Option<f64>,
        capacity: usize,
    ) -> Result<Self, ModelError> {
        let law = PursuitLaw {
            target_id,
            controller: PidController::new(gains)?,
        };
        Agent::new(id, initial, law, timestep, capacity)
    }

    /// 直近ティックの P, I, D 成分
    pub fn pid_breakdown(&self) -> PidBreakdown {
        self.law().controller.breakdown()
    }

    pub fn integral_accumulator(&self) -> Vector2 {
        self.law().controller.integral()
    }

    pub fn target_id(&self) -> &str {
        &self.law().target_id
    }

    pub fn gains(&self) -> &PidGains {
        self.law().controller.gains()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::traits::ITrackable;

    fn close(a: Vector2, b: Vector2) -> bool {
        (a - b).abs_le(1e-9)
    }

    #[test]
    fn test_gain_validation() {
        assert!(PidGains::default().validate().is_ok());

        let zero = PidGains { kp: 0.0, ki: 0.0, kd: 0.0, ..PidGains::default() };
        assert!(zero.validate().is_ok());

        let negative = PidGains { kd: -0.1, ..PidGains::default() };
        assert_eq!(negative.validate(), Err(ModelError::InvalidGain { name: "kd", value: -0.1 }));

        let no_windup = PidGains { integral_limit: 0.0, ..PidGains::default() };
        assert_eq!(
            no_windup.validate(),
            Err(ModelError::InvalidLimit { name: "integral_limit", value: 0.0 })
        );

        let nan = PidGains { actuator_limit: f64::NAN, ..PidGains::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_first_step_terms() {
        let mut pid = PidController::new(PidGains::default()).unwrap();
        let error = Vector2::new(-3.0, -4.0);
        let command = pid.compute(error, 0.01);
        let b = pid.breakdown();

        assert!(close(b.p, Vector2::new(-12.0, -16.0)));
        assert!(close(b.i, Vector2::new(-0.045, -0.06)));
        // 前回誤差0からの差分
        assert!(close(b.d, Vector2::new(-22.5, -30.0)));
        assert_eq!(command, Vector2::new(-25.0, -25.0));
        assert_eq!(pid.previous_error(), error);
    }

    #[test]
    fn test_derivative_uses_previous_sample() {
        let mut pid = PidController::new(PidGains::default()).unwrap();
        pid.compute(Vector2::new(1.0, 1.0), 0.01);
        pid.compute(Vector2::new(0.9, 1.1), 0.01);
        let b = pid.breakdown();
        assert!(close(b.d, Vector2::new(-0.75, 0.75)));
    }

    #[test]
    fn test_integral_clamped_under_sustained_error() {
        let gains = PidGains::default();
        let mut pid = PidController::new(gains).unwrap();
        for _ in 0..10_000 {
            let command = pid.compute(Vector2::new(1000.0, -1000.0), 0.01);
            assert!(pid.integral().x.abs() <= gains.integral_limit);
            assert!(pid.integral().y.abs() <= gains.integral_limit);
            assert!(command.x.abs() <= gains.actuator_limit);
            assert!(command.y.abs() <= gains.actuator_limit);
        }
        assert_eq!(pid.integral(), Vector2::new(20.0, -20.0));
    }

    #[test]
    fn test_breakdown_read_has_no_side_effects() {
        let mut a = PidController::new(PidGains::default()).unwrap();
        let mut b = a.clone();

        a.compute(Vector2::new(0.5, -0.25), 0.01);
        b.compute(Vector2::new(0.5, -0.25), 0.01);

        for _ in 0..5 {
            let _ = a.breakdown();
        }

        let next_a = a.compute(Vector2::new(0.4, -0.2), 0.01);
        let next_b = b.compute(Vector2::new(0.4, -0.2), 0.01);
        assert_eq!(next_a, next_b);
        assert_eq!(a.breakdown(), b.breakdown());
    }

    #[test]
    fn test_reset_clears_memory() {
        let mut pid = PidController::new(PidGains::default()).unwrap();
        pid.compute(Vector2::new(2.0, 2.0), 0.01);
        pid.reset();
        assert_eq!(pid.integral(), Vector2::ZERO);
        assert_eq!(pid.previous_error(), Vector2::ZERO);
        assert_eq!(pid.breakdown(), PidBreakdown::default());
    }

    #[test]
    fn test_pursuer_without_target_does_not_update() {
        let mut pursuer = Pursuer::spawn(
            "P".to_string(),
            Vector2::new(1.0, 1.0),
            "E".to_string(),
            PidGains::default(),
            None,
            8,
        )
        .unwrap();
        assert!(!pursuer.advance(0.0, None).unwrap());
        assert_eq!(pursuer.tick(), 1);
        assert_eq!(pursuer.pid_breakdown(), PidBreakdown::default());
        assert_eq!(pursuer.target_id(), "E");
    }

    #[test]
    fn test_zero_gains_never_move() {
        let gains = PidGains { kp: 0.0, ki: 0.0, kd: 0.0, ..PidGains::default() };
        let mut pursuer = Pursuer::spawn("P".to_string(), Vector2::new(0.0, 10.0), "E".to_string(), gains, None, 64).unwrap();
        for k in 0..50 {
            pursuer.advance(k as f64 * 0.01, Some(Vector2::new(k as f64, -3.0))).unwrap();
            assert_eq!(pursuer.last_command(), Some(Vector2::ZERO));
        }
        assert_eq!(pursuer.tick(), 51);
        assert!(pursuer.trajectory().iter().all(|p| *p == Vector2::new(0.0, 10.0)));
    }

    #[test]
    fn test_invalid_gains_rejected_at_spawn() {
        let gains = PidGains { kp: f64::INFINITY, ..PidGains::default() };
        let result = Pursuer::spawn("P".to_string(), Vector2::ZERO, "E".to_string(), gains, None, 8);
        assert!(matches!(result, Err(ModelError::InvalidGain { name: "kp", .. })));
    }
}
