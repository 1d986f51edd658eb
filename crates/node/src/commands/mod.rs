pub mod import_replica;
pub mod run;
pub mod snapshot;
