use crate::error::Result;

/// 一定間隔でエンジンのtickを呼ぶタイマー
///
/// コールバックの中身は実装側が生成時に受け取る。
/// `cancel`が戻った後に追加のtickが発火してはならない。
pub trait TickTimer {
    fn schedule(&mut self, interval_ms: u32) -> Result<()>;

    fn cancel(&mut self);

    fn is_scheduled(&self) -> bool;
}

/// 稼働中だけ表示する停止ボタン
pub trait ControlSurface {
    fn show(&mut self) -> Result<()>;

    fn hide(&mut self);

    fn is_visible(&self) -> bool;
}
