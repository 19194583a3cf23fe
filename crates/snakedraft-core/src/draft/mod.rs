// Snake draft domain: roles, players, number pool, turn order and the engine
// that ties them together.

pub mod engine;
pub mod player;
pub mod pool;
pub mod roles;
pub mod state;
pub mod turn;
