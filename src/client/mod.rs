pub mod event;
pub mod runtime;
pub mod view;
