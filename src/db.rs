pub mod memory;
pub mod postgres;
mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{AnimalStore, DashboardStore, EstablishmentStore, RodeoStore, Store, UserStore};
