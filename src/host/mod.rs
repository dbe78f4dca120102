//! Native host: serves the bundled content under a reserved hostname and
//! answers bridge requests from it.

pub mod assets;
pub mod bridge;
pub mod router;

pub use assets::{AssetBundle, AssetError, AssetInterceptor, AssetResponse};
pub use bridge::{
    in_process, Haptics, HostBridge, HostServices, LoggedHaptics, PushTokenProvider,
    StaticPushToken, HAPTIC_PULSE,
};
pub use router::{router, HostState};
