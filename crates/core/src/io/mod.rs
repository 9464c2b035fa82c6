//! I/O operations for reading and writing vector data

mod geojson;

pub use geojson::{read_geojson, read_geojson_from_str, write_geojson, write_geojson_to_string};
