pub mod overlay;
pub mod sandbox2d;
