pub mod assets;
pub mod character;
pub mod hole;
pub mod special;
pub mod visual;
