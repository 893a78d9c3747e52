use crate::models::{EvaderLaw, PidGains, Vector2};
use crate::simulation::DEFAULT_INTERCEPT_TOLERANCE;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "cat_and_mouse".to_string(),
            description: "振動しながら前進する逃避側をPID制御の追跡側が追う基本シナリオ".to_string(),
        }
    }
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 時間刻み（秒）
    pub dt_s: f64,
    /// ステップ上限（履歴容量もこの値から決まる）
    pub max_steps: u64,
    /// 外部からの早期打ち切り上限
    pub step_cap: Option<u64>,
    /// 指定時は `[0, t_end_s]` を `max_steps` 点で等分した時刻で運動則を評価
    pub t_end_s: Option<f64>,
    /// 追跡側の初期位置を乱数で決める場合のシード値
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_s: 0.01,
            max_steps: 100_000,
            step_cap: Some(500),
            t_end_s: Some(10.0),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Position2D {
    pub x_m: f64,
    pub y_m: f64,
}

impl Position2D {
    pub fn to_vector(self) -> Vector2 {
        Vector2::new(self.x_m, self.y_m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RegionRect {
    pub xmin_m: f64,
    pub xmax_m: f64,
    pub ymin_m: f64,
    pub ymax_m: f64,
}

impl Default for RegionRect {
    fn default() -> Self {
        Self {
            xmin_m: -5.0,
            xmax_m: 5.0,
            ymin_m: -5.0,
            ymax_m: 5.0,
        }
    }
}

/// 逃避側の運動設定
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionConfig {
    Oscillating {
        vx_mps: f64,
        amplitude_mps: f64,
        omega_rad_s: f64,
    },
    Stationary,
}

impl Default for MotionConfig {
    fn default() -> Self {
        MotionConfig::Oscillating {
            vx_mps: 1.0,
            amplitude_mps: 2.0,
            omega_rad_s: 1000.0,
        }
    }
}

impl MotionConfig {
    pub fn to_law(self) -> EvaderLaw {
        match self {
            MotionConfig::Oscillating {
                vx_mps,
                amplitude_mps,
                omega_rad_s,
            } => EvaderLaw::Oscillating {
                vx: vx_mps,
                amplitude: amplitude_mps,
                omega: omega_rad_s,
            },
            MotionConfig::Stationary => EvaderLaw::Stationary,
        }
    }
}

/// 逃避側設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaderConfig {
    pub id: String,
    pub initial: Position2D,
    pub motion: MotionConfig,
}

impl Default for EvaderConfig {
    fn default() -> Self {
        Self {
            id: "E001".to_string(),
            initial: Position2D::default(),
            motion: MotionConfig::default(),
        }
    }
}

/// PIDゲイン設定
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GainsConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_limit: f64,
    pub actuator_limit: f64,
}

impl Default for GainsConfig {
    fn default() -> Self {
        let g = PidGains::default();
        Self {
            kp: g.kp,
            ki: g.ki,
            kd: g.kd,
            integral_limit: g.integral_limit,
            actuator_limit: g.actuator_limit,
        }
    }
}

impl GainsConfig {
    pub fn to_gains(self) -> PidGains {
        PidGains {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            integral_limit: self.integral_limit,
            actuator_limit: self.actuator_limit,
        }
    }
}

/// 追跡側設定
///
/// `initial` が無い場合は `spawn_rect` 内の一様乱数で初期位置を決定します。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PursuerConfig {
    pub id: String,
    pub initial: Option<Position2D>,
    pub spawn_rect: RegionRect,
    pub gains: GainsConfig,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        Self {
            id: "P001".to_string(),
            initial: None,
            spawn_rect: RegionRect::default(),
            gains: GainsConfig::default(),
        }
    }
}

/// 迎撃判定設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct InterceptionConfig {
    pub tolerance_m: f64,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            tolerance_m: DEFAULT_INTERCEPT_TOLERANCE,
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub evader: EvaderConfig,
    pub pursuer: PursuerConfig,
    pub interception: InterceptionConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(Path::new("<inline>").to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 時間設定の検証
        if !(self.sim.dt_s.is_finite() && self.sim.dt_s > 0.0) {
            return Err(ScenarioError::ValidationError("dt_s must be positive".to_string()));
        }
        if self.sim.max_steps == 0 {
            return Err(ScenarioError::ValidationError("max_steps must be positive".to_string()));
        }
        if self.sim.step_cap == Some(0) {
            return Err(ScenarioError::ValidationError("step_cap must be positive".to_string()));
        }
        if let Some(t_end) = self.sim.t_end_s {
            if !(t_end.is_finite() && t_end > 0.0) {
                return Err(ScenarioError::ValidationError("t_end_s must be positive".to_string()));
            }
        }

        // 迎撃判定の検証
        let tolerance = self.interception.tolerance_m;
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(ScenarioError::ValidationError(
                "tolerance_m must be non-negative".to_string(),
            ));
        }

        // ゲインの検証
        self.pursuer
            .gains
            .to_gains()
            .validate()
            .map_err(|e| ScenarioError::ValidationError(e.to_string()))?;

        // 初期位置の検証
        if !self.evader.initial.to_vector().is_finite() {
            return Err(ScenarioError::ValidationError("evader initial position must be finite".to_string()));
        }
        match self.pursuer.initial {
            Some(initial) if !initial.to_vector().is_finite() => {
                return Err(ScenarioError::ValidationError(
                    "pursuer initial position must be finite".to_string(),
                ));
            }
            Some(_) => {}
            None => {
                let rect = &self.pursuer.spawn_rect;
                let finite = [rect.xmin_m, rect.xmax_m, rect.ymin_m, rect.ymax_m]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite || rect.xmin_m > rect.xmax_m || rect.ymin_m > rect.ymax_m {
                    return Err(ScenarioError::ValidationError("Invalid spawn_rect bounds".to_string()));
                }
            }
        }

        Ok(())
    }

    /// 実際に実行するステップ数（max_steps と step_cap の小さい方）
    pub fn step_budget(&self) -> u64 {
        match self.sim.step_cap {
            Some(cap) => cap.min(self.sim.max_steps),
            None => self.sim.max_steps,
        }
    }

    /// 追跡側の初期位置
    ///
    /// 明示指定が無ければ `sim.seed` から決まる乱数で `spawn_rect` 内に配置します。
    pub fn pursuer_start(&self) -> Vector2 {
        if let Some(initial) = self.pursuer.initial {
            return initial.to_vector();
        }
        let rect = &self.pursuer.spawn_rect;
        let mut rng = ChaCha8Rng::seed_from_u64(self.sim.seed);
        Vector2::new(
            rng.gen_range(rect.xmin_m..=rect.xmax_m),
            rng.gen_range(rect.ymin_m..=rect.ymax_m),
        )
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大ステップ数: {}", self.sim.max_steps);
        if let Some(cap) = self.sim.step_cap {
            println!("打ち切りステップ数: {}", cap);
        }
        if let Some(t_end) = self.sim.t_end_s {
            println!("時刻格子: 0〜{:.1}秒を{}点で等分", t_end, self.sim.max_steps);
        }
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== 逃避側 ===");
        println!("ID: {}", self.evader.id);
        println!("初期位置: {}", self.evader.initial.to_vector());
        match self.evader.motion {
            MotionConfig::Oscillating {
                vx_mps,
                amplitude_mps,
                omega_rad_s,
            } => println!(
                "運動則: vx = {}, vy = {}·cos({}·t)",
                vx_mps, amplitude_mps, omega_rad_s
            ),
            MotionConfig::Stationary => println!("運動則: 静止"),
        }
        println!();

        println!("=== 追跡側 ===");
        println!("ID: {}", self.pursuer.id);
        println!("初期位置: {}", self.pursuer_start());
        let g = &self.pursuer.gains;
        println!("ゲイン: Kp = {}, Ki = {}, Kd = {}", g.kp, g.ki, g.kd);
        println!("積分上限: {}, 飽和上限: {}", g.integral_limit, g.actuator_limit);
        println!("迎撃判定許容差: {}m", self.interception.tolerance_m);
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}
