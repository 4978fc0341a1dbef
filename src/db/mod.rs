pub mod gateway;
pub mod mongo;
pub mod saved_store;
pub mod trip_writer;
