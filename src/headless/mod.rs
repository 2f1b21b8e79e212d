//! ブラウザ無しでエンジンを動かすためのホスト一式
//!
//! テストとネイティブ版バイナリが使う。

pub mod tree;
pub mod pedigree;
pub mod host;
pub mod runner;

pub use host::{HeadlessHost, ManualTimer, SimChangeSource, SimStopControl};
pub use pedigree::PedigreePage;
pub use runner::{HeadlessRunner, RunOptions, RunReport};
pub use tree::{NodeId, SimDocument};
