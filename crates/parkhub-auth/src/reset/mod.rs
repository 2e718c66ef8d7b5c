//! Password-reset token lifecycle.

pub mod flow;
pub mod notifier;

pub use flow::PasswordResetFlow;
pub use notifier::{LoggingResetNotifier, ResetNotifier};
