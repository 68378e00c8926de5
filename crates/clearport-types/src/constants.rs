//! System-wide constants for the Clearport settlement engine.

/// Domain separator for offer signing payloads.
pub const OFFER_DOMAIN: &[u8] = b"clearport:offer:v1:";

/// Domain separator for fill signing payloads.
pub const FILL_DOMAIN: &[u8] = b"clearport:fill:v1:";

/// Domain separator for swap signing payloads.
pub const SWAP_DOMAIN: &[u8] = b"clearport:swap:v1:";

/// Domain separator for withdrawal signing payloads.
pub const WITHDRAW_DOMAIN: &[u8] = b"clearport:withdraw:v1:";

/// Domain separator for offer-cancel signing payloads.
pub const CANCEL_DOMAIN: &[u8] = b"clearport:cancel:v1:";

/// Domain separator for spender-approval signing payloads.
pub const SPENDER_DOMAIN: &[u8] = b"clearport:spender:v1:";

/// Bits per word in the nonce bitmap.
pub const NONCE_WORD_BITS: u64 = 64;

/// Default delay between announcing an offer cancellation and being
/// allowed to execute it (seconds). Gives the counterparty coordinator
/// time to settle in-flight matches against the offer.
pub const DEFAULT_ANNOUNCE_DELAY_SECS: i64 = 604_800;

/// Maximum announce-cancel delay a broker may be configured with (seconds).
pub const MAX_ANNOUNCE_DELAY_SECS: i64 = 2_592_000;

/// Maximum matches accepted in a single trade or network-trade batch.
pub const MAX_MATCHES_PER_BATCH: usize = 1_024;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Clearport";
