// 基本的なデータ型と数学ユーティリティ
pub mod common;

// モデル層のエラー型
pub mod error;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 各エージェントモデルの実装
pub mod agent;
pub mod evader;
pub mod pursuer;

// 便利な re-export
pub use common::*;
pub use error::ModelError;
pub use traits::*;
pub use agent::{Agent, DEFAULT_TIMESTEP};
pub use evader::{Evader, EvaderLaw};
pub use pursuer::{PidBreakdown, PidController, PidGains, Pursuer, PursuitLaw};
