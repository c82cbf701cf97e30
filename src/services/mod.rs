// Services module - business logic layer

pub mod metadata;
