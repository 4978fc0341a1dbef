pub mod completion_client;
pub mod fallback_corpus;
pub mod pipeline;
pub mod plan_recovery;
pub mod saved_reconciler;
pub mod trip_actions;
pub mod trip_plan_generator;
pub mod trip_views;
