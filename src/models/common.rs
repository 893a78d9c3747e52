use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// 2次元ベクトル（位置・速度・制御指令を共通で表現）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// ユークリッドノルム
    pub fn norm(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 2点間のユークリッド距離
    pub fn distance(&self, other: &Vector2) -> f64 {
        (*other - *self).norm()
    }

    /// 各成分を独立に [-limit, limit] にクリップ
    pub fn clamp_components(&self, limit: f64) -> Self {
        Self::new(self.x.clamp(-limit, limit), self.y.clamp(-limit, limit))
    }

    /// 各成分の絶対値が tolerance 以下かどうか
    pub fn abs_le(&self, tolerance: f64) -> bool {
        self.x.abs() <= tolerance && self.y.abs() <= tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl std::fmt::Display for Vector2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// エージェントの状態を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentStatus {
    Active, // アクティブ
    Frozen, // 凍結（迎撃成立後など、以降の更新なし）
}

/// 距離の取得方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMode {
    /// スカラー距離（ユークリッド）
    Scalar,
    /// 成分ごとの変位
    Components,
}

/// 2エージェント間の離隔
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Separation {
    Scalar(f64),
    Components(Vector2),
}

impl Separation {
    /// スカラー距離として取り出す（成分表現の場合はノルムを返す）
    pub fn magnitude(&self) -> f64 {
        match self {
            Separation::Scalar(d) => *d,
            Separation::Components(v) => v.norm(),
        }
    }
}
