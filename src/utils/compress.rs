use std::io::{self, Read};

use flate2::{
    Compression,
    bufread::{DeflateDecoder, DeflateEncoder},
};

pub fn encode(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoded = Vec::with_capacity(data.len() / 4);
    DeflateEncoder::new(data, Compression::best()).read_to_end(&mut encoded)?;

    Ok(encoded)
}

pub fn decode(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(data.len() * 4);
    DeflateDecoder::new(data).read_to_end(&mut decoded)?;

    Ok(decoded)
}
