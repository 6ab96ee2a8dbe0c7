//! Conversion between object graphs, chunks and the chunk wire form.
//!
//! - [`serialize`]: object graph to chunk
//! - [`deserialize`]: chunk to object graph (three-pass resolution)
//! - [`json`]: JSON text, optionally zstd compressed
//! - [`value`]: property value text encoding

pub mod deserialize;
pub mod json;
pub mod serialize;
pub mod value;

pub use deserialize::{deserialize, deserialize_with_options, DeserializeOptions, Deserialized};
pub use json::{
    decode_chunk, decode_chunk_str, decompress, encode_chunk, encode_chunk_compressed,
    encode_chunk_pretty,
};
pub use serialize::{serialize, serialize_graph, serialize_with_options, SerializeOptions};
pub use value::{decode_value, encode_value, value_type, ValueType};
