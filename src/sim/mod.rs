pub mod bus;
pub mod event;
pub mod game;
pub mod garden;
pub mod life_bar;
pub mod marks;
pub mod score;
pub mod spawner;
