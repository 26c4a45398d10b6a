pub mod battery;
pub mod icons;
pub mod layout;
pub mod renderer;
pub mod snapshot;
mod util;
