//! Use case implementations.

mod process_message_use_case;

pub use process_message_use_case::ProcessMessageUseCase;
