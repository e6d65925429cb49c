mod rtc_peer_link;

pub use rtc_peer_link::*;
