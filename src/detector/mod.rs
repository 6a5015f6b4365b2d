pub mod change;
pub mod classifier;

pub use change::should_notify;
pub use classifier::{classify_target, SlotClassifier};
