//! Image sourcing: fetching and encoding.

mod fetcher;
mod types;

pub use fetcher::{HttpImageFetcher, HttpImageFetcherBuilder, ImageFetcher};
pub use types::{EncodedImage, ImageFormat};
