pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::{create_player, delete_player, get_player};
pub use models::PlayerModel;
pub use repository::{InMemoryPlayerRepository, PlayerRepository, PostgresPlayerRepository};
pub use service::PlayerService;
