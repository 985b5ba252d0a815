//! Pluggable byte handling: transformers (bytes → value) and codecs (bytes → bytes).
//!
//! Both are narrow strategy traits with blanket impls for closures, so a job
//! can take either a built-in below or a plain `Fn`.

use crate::error::TransformError;
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::marker::PhantomData;

/// Turns raw (or cached and deserialized) bytes into the caller's value.
pub trait Transformer<R>: Send + Sync {
    fn transform(&self, bytes: &[u8]) -> Result<R, TransformError>;
}

impl<R, F> Transformer<R> for F
where
    F: Fn(&[u8]) -> Result<R, TransformError> + Send + Sync,
{
    fn transform(&self, bytes: &[u8]) -> Result<R, TransformError> {
        self(bytes)
    }
}

/// Byte-to-byte transform applied only to what is stored on disk.
pub trait ByteCodec: Send + Sync {
    fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError>;
}

impl<F> ByteCodec for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, TransformError> + Send + Sync,
{
    fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        self(bytes)
    }
}

/// Returns the bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl Transformer<Vec<u8>> for RawBytes {
    fn transform(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(bytes.to_vec())
    }
}

/// Strict UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Text;

impl Transformer<String> for Utf8Text {
    fn transform(&self, bytes: &[u8]) -> Result<String, TransformError> {
        Ok(std::str::from_utf8(bytes)?.to_string())
    }
}

/// UTF-8 text with surrounding whitespace removed; the default for checksum jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumText;

impl Transformer<String> for ChecksumText {
    fn transform(&self, bytes: &[u8]) -> Result<String, TransformError> {
        Ok(std::str::from_utf8(bytes)?.trim().to_string())
    }
}

/// Deserializes a JSON document into `T`.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub fn new() -> Self {
        Json(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Transformer<T> for Json<T> {
    fn transform(&self, bytes: &[u8]) -> Result<T, TransformError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Gzip-compresses payloads before they are written to the cache.
#[derive(Debug, Clone, Copy)]
pub struct GzipEncode(pub Compression);

impl Default for GzipEncode {
    fn default() -> Self {
        GzipEncode(Compression::default())
    }
}

impl ByteCodec for GzipEncode {
    fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::new();
        GzEncoder::new(bytes, self.0).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Inflates payloads written by `GzipEncode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipDecode;

impl ByteCodec for GzipDecode {
    fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out)?;
        Ok(out)
    }
}
