/// モデル層のエラー
///
/// 構築時の入力検証エラーと、履歴バッファ枯渇などのプログラミングエラーを表します。
/// 迎撃成立・ステップ上限到達・キャンセルは正常終了であり、ここには含まれません。
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// 時間刻みが正の有限値でない
    InvalidTimestep(f64),
    /// ゲインが非負の有限値でない
    InvalidGain { name: &'static str, value: f64 },
    /// 積分上限・飽和上限などのリミットが正の有限値でない
    InvalidLimit { name: &'static str, value: f64 },
    /// 初期位置が有限値でない
    InvalidPosition { agent_id: String },
    /// 履歴容量が 1 未満（初期位置すら記録できない）
    InvalidCapacity(usize),
    /// 迎撃判定の許容差が非負の有限値でない
    InvalidTolerance(f64),
    /// ステップ上限が 0
    InvalidStepBudget(u64),
    /// シナリオ設定の検証に失敗
    InvalidScenario(String),
    /// 履歴バッファの容量を超えて更新しようとした
    HistoryExhausted { agent_id: String, capacity: usize },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::InvalidTimestep(dt) => {
                write!(f, "時間刻みは正の有限値である必要があります: {}", dt)
            }
            ModelError::InvalidGain { name, value } => {
                write!(f, "ゲイン {} は非負の有限値である必要があります: {}", name, value)
            }
            ModelError::InvalidLimit { name, value } => {
                write!(f, "リミット {} は正の有限値である必要があります: {}", name, value)
            }
            ModelError::InvalidPosition { agent_id } => {
                write!(f, "エージェント {} の初期位置が有限値ではありません", agent_id)
            }
            ModelError::InvalidCapacity(capacity) => {
                write!(f, "履歴容量は1以上である必要があります: {}", capacity)
            }
            ModelError::InvalidTolerance(tolerance) => {
                write!(f, "迎撃判定の許容差は非負の有限値である必要があります: {}", tolerance)
            }
            ModelError::InvalidStepBudget(budget) => {
                write!(f, "ステップ上限は1以上である必要があります: {}", budget)
            }
            ModelError::InvalidScenario(msg) => write!(f, "シナリオ設定が不正です: {}", msg),
            ModelError::HistoryExhausted { agent_id, capacity } => {
                write!(f, "エージェント {} の履歴バッファが枯渇しました (容量: {})", agent_id, capacity)
            }
        }
    }
}

impl std::error::Error for ModelError {}
