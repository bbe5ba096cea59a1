mod api;
mod device;
mod device_type;
mod directory;
mod normalize;
mod reading;
mod status;

pub use api::*;
pub use device::*;
pub use device_type::*;
pub use directory::*;
pub use normalize::*;
pub use reading::*;
pub use status::*;
