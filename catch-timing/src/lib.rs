pub mod clock;
pub mod timer;

pub use clock::{Stopwatch, TrialClock};
pub use timer::{FrameStats, HighPrecisionTimer, ManualTimer, Timer};
