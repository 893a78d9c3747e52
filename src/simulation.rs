//! # Simulation モジュール
//!
//! 追跡シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! 固定時間刻みで逃避側・追跡側の2エージェントを1ティックずつ進め、
//! 相対距離の追跡と迎撃判定を行います。描画やリアルタイムのペーシングは
//! [`FrameObserver`] を実装する表示層の責務であり、エンジンの演算には介入しません。
//!
//! ## 状態遷移
//!
//! `Running → Intercepted` / `Running → Exhausted` / `Running → Cancelled`
//! のいずれかで終了し、終了状態からは遷移しません。
//!
//! ## 1ティックの処理順序
//!
//! 1. **逃避側更新**: 開ループ運動則による移動
//! 2. **追跡側更新**: 更新後の逃避側位置に対するPID制御
//! 3. **距離記録**: スカラー距離と最接近距離の更新
//! 4. **迎撃判定**: 成分ごとの絶対許容差による判定
//!
//! ## 使用例
//!
//! ```rust,no_run
//! use pursuitsim::scenario::ScenarioConfig;
//! use pursuitsim::simulation::{CancelFlag, NullObserver, SimulationEngine};
//!
//! let config = ScenarioConfig::default();
//! let mut engine = SimulationEngine::new(&config, 0).unwrap();
//! let result = engine.run(&mut NullObserver, &CancelFlag::new()).unwrap();
//! println!("closest: {}", result.closest_distance);
//! ```

use crate::models::*;
use crate::scenario::ScenarioConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// デフォルトの迎撃判定許容差（メートル）
pub const DEFAULT_INTERCEPT_TOLERANCE: f64 = 0.05;

/// シミュレーションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// 実行中
    Running,
    /// 迎撃成立
    Intercepted,
    /// ステップ上限到達
    Exhausted,
    /// 外部からの停止要求による打ち切り
    Cancelled,
}

impl SimulationState {
    pub fn is_terminal(&self) -> bool {
        *self != SimulationState::Running
    }
}

/// 各ティックで逃避側の運動則に渡す時刻の決め方
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeGrid {
    /// `t_k = k * dt`
    Uniform { dt: f64 },
    /// `[0, t_end]` を `samples` 点で等分した格子
    Spaced { t_end: f64, samples: u64 },
}

impl TimeGrid {
    /// k 番目（0始まり）のティックの時刻
    pub fn time(&self, k: u64) -> f64 {
        match *self {
            TimeGrid::Uniform { dt } => k as f64 * dt,
            TimeGrid::Spaced { t_end, samples } => {
                if samples <= 1 {
                    0.0
                } else {
                    t_end * k as f64 / (samples - 1) as f64
                }
            }
        }
    }
}

/// 迎撃判定
///
/// 相対許容差は0、絶対許容差 `tolerance` で成分ごとに近似一致を判定します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptionTest {
    tolerance: f64,
}

impl Default for InterceptionTest {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_INTERCEPT_TOLERANCE,
        }
    }
}

impl InterceptionTest {
    /// 許容差は非負の有限値である必要があります
    pub fn new(tolerance: f64) -> Result<Self, ModelError> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(ModelError::InvalidTolerance(tolerance));
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// `|Δx| <= tolerance && |Δy| <= tolerance`
    pub fn check(&self, a: Vector2, b: Vector2) -> bool {
        (a - b).abs_le(self.tolerance)
    }
}

/// 外部からの停止要求フラグ
///
/// 表示層（ウィンドウクローズ、Ctrl-C など）がセットし、エンジンが1ティックに1回ポーリングします。
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 1ティック分の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub state: SimulationState,
    /// 実行済みティック数
    pub step: u64,
    /// 直近ティックの時刻
    pub time: f64,
    /// 直近のスカラー距離
    pub distance: f64,
}

/// 終了レポート
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub state: SimulationState,
    pub intercepted: bool,
    pub interception_tick: Option<u64>,
    pub terminal_tick: u64,
    pub terminal_time: f64,
    /// 全サンプル（最終サンプルを含む）の最小スカラー距離
    pub closest_distance: f64,
    pub wall_clock_elapsed: Duration,
}

/// 表示層のフック
///
/// エンジンは1ティックごとに1回呼び出します。エンジンは共有参照で渡されるため、
/// オブザーバから状態を変更することはできません。
pub trait FrameObserver {
    fn on_frame(&mut self, engine: &SimulationEngine, report: &StepReport);
}

/// 何もしないオブザーバ
pub struct NullObserver;

impl FrameObserver for NullObserver {
    fn on_frame(&mut self, _engine: &SimulationEngine, _report: &StepReport) {}
}

pub struct SimulationEngine {
    evader: Evader,
    pursuer: Pursuer,
    interception: InterceptionTest,
    time_grid: TimeGrid,
    step_budget: u64,
    step_count: u64,
    current_time: f64,
    state: SimulationState,
    last_distance: f64,
    closest_distance: Option<f64>,
    interception_tick: Option<u64>,
    verbose_level: u8,
}

impl SimulationEngine {
    /// シナリオ設定からエンジンを構築します
    ///
    /// 設定は構築前に検証され、不正な値は `ModelError` として返ります。
    pub fn new(scenario: &ScenarioConfig, verbose_level: u8) -> Result<Self, ModelError> {
        scenario
            .validate()
            .map_err(|e| ModelError::InvalidScenario(e.to_string()))?;
        let interception = InterceptionTest::new(scenario.interception.tolerance_m)?;

        let dt = scenario.sim.dt_s;
        let capacity = (scenario.sim.max_steps as usize).saturating_add(1);

        let evader = Evader::spawn(
            scenario.evader.id.clone(),
            scenario.evader.initial.to_vector(),
            scenario.evader.motion.to_law(),
            Some(dt),
            capacity,
        )?;

        let pursuer_start = scenario.pursuer_start();
        let pursuer = Pursuer::spawn(
            scenario.pursuer.id.clone(),
            pursuer_start,
            evader.get_id(),
            scenario.pursuer.gains.to_gains(),
            Some(dt),
            capacity,
        )?;

        let time_grid = match scenario.sim.t_end_s {
            Some(t_end) => TimeGrid::Spaced {
                t_end,
                samples: scenario.sim.max_steps,
            },
            None => TimeGrid::Uniform { dt },
        };

        let step_budget = scenario.step_budget();

        if verbose_level > 0 {
            info!(
                evader_id = %evader.get_id(),
                pursuer_id = %pursuer.get_id(),
                evader_x = evader.current_position().x,
                evader_y = evader.current_position().y,
                pursuer_x = pursuer_start.x,
                pursuer_y = pursuer_start.y,
                step_budget = step_budget,
                "シミュレーションエンジンを初期化しました"
            );
        }

        Self::from_agents(evader, pursuer, interception, time_grid, step_budget, verbose_level)
    }

    /// 構築済みエージェントからエンジンを作成します
    pub fn from_agents(
        evader: Evader,
        pursuer: Pursuer,
        interception: InterceptionTest,
        time_grid: TimeGrid,
        step_budget: u64,
        verbose_level: u8,
    ) -> Result<Self, ModelError> {
        if step_budget == 0 {
            return Err(ModelError::InvalidStepBudget(step_budget));
        }

        let last_distance = pursuer.current_position().distance(&evader.current_position());
        Ok(Self {
            evader,
            pursuer,
            interception,
            time_grid,
            step_budget,
            step_count: 0,
            current_time: 0.0,
            state: SimulationState::Running,
            last_distance,
            closest_distance: None,
            interception_tick: None,
            verbose_level,
        })
    }

    pub fn evader(&self) -> &Evader {
        &self.evader
    }

    pub fn pursuer(&self) -> &Pursuer {
        &self.pursuer
    }

    /// 追跡側から見た逃避側との離隔
    pub fn distance(&self, mode: DistanceMode) -> Separation {
        self.pursuer.distance_to(self.evader.current_position(), mode)
    }

    pub fn closest_distance(&self) -> f64 {
        self.closest_distance.unwrap_or(self.last_distance)
    }

    pub fn interception_tick(&self) -> Option<u64> {
        self.interception_tick
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// 実行済みティック数
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn step_budget(&self) -> u64 {
        self.step_budget
    }

    pub fn time_grid(&self) -> TimeGrid {
        self.time_grid
    }

    pub fn interception(&self) -> InterceptionTest {
        self.interception
    }

    fn report(&self) -> StepReport {
        StepReport {
            state: self.state,
            step: self.step_count,
            time: self.current_time,
            distance: self.last_distance,
        }
    }

    /// 時刻 `t` で1ティック進めます
    ///
    /// 終了状態では何も変更せず現在の状態を返します。
    pub fn step(&mut self, t: f64) -> Result<StepReport, ModelError> {
        if self.state.is_terminal() {
            return Ok(self.report());
        }

        // 片側だけ進んだ状態を残さないよう、両者の容量を先に確認する
        self.evader.ensure_room()?;
        self.pursuer.ensure_room()?;

        self.evader.advance(t, None)?;
        let target = self.evader.current_position();
        self.pursuer.advance(t, Some(target))?;

        self.step_count += 1;
        self.current_time = t;

        let distance = self.distance(DistanceMode::Scalar).magnitude();
        self.last_distance = distance;
        self.closest_distance = Some(match self.closest_distance {
            Some(closest) => closest.min(distance),
            None => distance,
        });

        if self.interception.check(self.pursuer.current_position(), target) {
            self.state = SimulationState::Intercepted;
            self.interception_tick = Some(self.step_count);
            self.evader.freeze();
            self.pursuer.freeze();

            info!(
                pursuer_id = %self.pursuer.get_id(),
                evader_id = %self.evader.get_id(),
                tick = self.step_count,
                t = t,
                pursuer_x = self.pursuer.current_position().x,
                pursuer_y = self.pursuer.current_position().y,
                evader_x = target.x,
                evader_y = target.y,
                distance = distance,
                "INTERCEPTED: 追跡側が逃避側を捕捉しました"
            );
        } else if self.step_count >= self.step_budget {
            self.state = SimulationState::Exhausted;

            info!(
                tick = self.step_count,
                step_budget = self.step_budget,
                closest_distance = self.closest_distance(),
                "EXHAUSTED: ステップ上限に達しました"
            );
        }

        Ok(self.report())
    }

    /// 終了状態に達するか停止要求を受けるまでティックを進めます
    pub fn run(
        &mut self,
        observer: &mut dyn FrameObserver,
        cancel: &CancelFlag,
    ) -> Result<SimulationResult, ModelError> {
        info!("=== シミュレーション実行開始 ===");
        let started = Instant::now();

        while self.state == SimulationState::Running {
            if cancel.is_cancelled() {
                self.state = SimulationState::Cancelled;
                info!(
                    tick = self.step_count,
                    "CANCELLED: 停止要求によりシミュレーションを打ち切りました"
                );
                break;
            }

            let t = self.time_grid.time(self.step_count);
            let report = self.step(t)?;
            observer.on_frame(self, &report);

            if self.verbose_level > 2 {
                trace!(
                    "時刻: {:.4}秒 (ステップ: {}, 距離: {:.4})",
                    report.time, report.step, report.distance
                );
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.step_count as f64 / self.step_budget as f64) * 100.0;
                debug!(
                    "進行状況: {:.1}% ({}/{}ステップ, 最接近: {:.4})",
                    progress,
                    self.step_count,
                    self.step_budget,
                    self.closest_distance()
                );
            }
        }

        let result = self.result(started.elapsed());

        info!("=== シミュレーション完了 ===");
        info!("終了状態: {:?}", result.state);
        info!("総ステップ数: {}", result.terminal_tick);

        Ok(result)
    }

    /// 現時点の終了レポート
    pub fn result(&self, wall_clock_elapsed: Duration) -> SimulationResult {
        SimulationResult {
            state: self.state,
            intercepted: self.state == SimulationState::Intercepted,
            interception_tick: self.interception_tick,
            terminal_tick: self.step_count,
            terminal_time: self.current_time,
            closest_distance: self.closest_distance(),
            wall_clock_elapsed,
        }
    }
}
