pub mod config;
pub mod logging;

pub mod cache;
pub mod checksum;
pub mod downloader;
pub mod error;
pub mod job;
pub mod transform;
pub mod transport;

pub use cache::{CachePaths, CacheStore};
pub use downloader::{DownloadOut, Downloader};
pub use error::{CacheError, DownloadError, PolicyError, TransformError, TransportError};
pub use job::{CachePolicy, ChecksumJob, Job};
pub use transport::{CurlTransport, FixtureTransport, RequestOptions, Transport};
