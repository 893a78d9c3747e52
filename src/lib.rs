//! # pursuitsim
//!
//! 2次元の追跡シミュレーション。
//! 開ループで運動する逃避側を、相対位置ベクトルに対するPID制御で追跡側が追いかけます。

pub mod logging;
pub mod models;
pub mod presenter;
pub mod scenario;
pub mod simulation;
