//! Framing, record transport and the duplex orchestrator.

/// Full-duplex endpoint.
pub mod duplex;
/// Proof-carrying frame encoding.
pub mod frame;
/// Outbound and inbound pipelines.
pub mod pipeline;
/// Wire records and async record I/O.
pub mod record;

pub use duplex::{Endpoint, Report};
pub use frame::{check_chunk, Frame, MAX_CHUNK_LEN};
pub use pipeline::{Authenticity, Delivery, Inbound, Outbound, RecvStats, SendStats};
pub use record::{decode_record, encode_record, read_record, write_record, RECORD_HEADER_LEN};
