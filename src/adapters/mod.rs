// Adapters layer: concrete implementations for external systems (filesystem, SMTP relay).

pub mod smtp;
pub mod storage;
