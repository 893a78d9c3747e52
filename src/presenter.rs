//! コンソール表示層
//!
//! エンジンの状態を1ティックごとに読み取り、位置の逐次表示とリアルタイム用のペーシングを行います。
//! ここでの待機はティックの順序や回数に影響しません。

use crate::models::ITrackable;
use crate::simulation::{FrameObserver, SimulationEngine, SimulationResult, SimulationState, StepReport};
use std::thread;
use std::time::Duration;

/// コンソール向けのフレームオブザーバ
#[derive(Debug, Clone, Default)]
pub struct ConsolePresenter {
    /// 各ティックの位置を標準出力へ表示するか
    pub echo: bool,
    /// 1フレームあたりの待機時間
    pub frame_delay: Option<Duration>,
    /// 描画したフレーム数
    pub frames: u64,
}

impl ConsolePresenter {
    pub fn new(echo: bool, frame_delay: Option<Duration>) -> Self {
        Self {
            echo,
            frame_delay,
            frames: 0,
        }
    }
}

impl FrameObserver for ConsolePresenter {
    fn on_frame(&mut self, engine: &SimulationEngine, report: &StepReport) {
        self.frames += 1;

        if self.echo {
            let e = engine.evader().current_position();
            let p = engine.pursuer().current_position();
            let b = engine.pursuer().pid_breakdown();
            println!(
                "[{:>6}] t={:.4} 逃避側: {} 追跡側: {} 距離: {:.4} P: {} I: {} D: {} 指令: {}",
                report.step, report.time, e, p, report.distance, b.p, b.i, b.d, b.command
            );
        }

        if let Some(delay) = self.frame_delay {
            thread::sleep(delay);
        }
    }
}

/// 終了レポートを表示
pub fn print_report(result: &SimulationResult) {
    println!("----------------------------------------");
    match result.state {
        SimulationState::Intercepted => println!(
            "迎撃成功: ステップ {} (シミュレーション時刻 {:.4}秒)",
            result.interception_tick.unwrap_or(result.terminal_tick),
            result.terminal_time
        ),
        SimulationState::Exhausted => println!("迎撃失敗: ステップ上限 {} に到達", result.terminal_tick),
        SimulationState::Cancelled => println!("中断: ステップ {} で停止要求を受信", result.terminal_tick),
        SimulationState::Running => println!("実行中: ステップ {}", result.terminal_tick),
    }
    println!("最接近距離: {:.6}", result.closest_distance);
    println!("実行時間: {:.3}秒", result.wall_clock_elapsed.as_secs_f64());
}
