pub mod target;
pub mod queue;
pub mod document;
pub mod change_source;
pub mod actuator;
pub mod scheduler;
pub mod lifecycle;

pub use actuator::{Actuator, ExpandOutcome};
pub use change_source::{collect_inserted_couples, ChangeSource, InsertSink};
pub use document::HostDocument;
pub use lifecycle::{EngineStats, ExpansionEngine, TickOutcome};
pub use queue::TargetQueue;
pub use scheduler::{ControlSurface, TickTimer};
pub use target::{Slot, TargetId};
