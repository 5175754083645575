pub mod disposition;
pub mod headers;
pub mod ids;
pub mod mdn;

pub use disposition::{Disposition, DispositionModifier, Mic};
pub use headers::TransportHeaders;
pub use ids::{ChannelId, MessageId, decode_path_segment, encode_path_segment};
pub use mdn::MdnData;
