// REST implementation of the document store.
//
// `client` owns transport mechanics (URL construction, API key injection,
// response and error parsing); `documents` implements the `DocumentStore`
// operations on top of it.

pub mod client;
mod documents;

pub use client::{RestStore, StoreConfig};
