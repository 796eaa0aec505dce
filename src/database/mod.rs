pub mod db;
pub mod gateway;
#[cfg(test)]
pub(crate) mod recording;

pub use db::SqliteStore;
pub use gateway::RemoteStore;
