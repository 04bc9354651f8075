mod codec;
mod fetcher;

pub use codec::ImageRsCodec;
pub use fetcher::HttpAttachmentFetcher;
