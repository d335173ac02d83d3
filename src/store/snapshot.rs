/// Snapshot file format
///
/// The whole bucket tree is written as one record per commit:
///
/// +-------+---------+-------------+----------+----------------+---------+
/// | Magic | Version | Compression | Checksum | Payload length | Payload |
/// +-------+---------+-------------+----------+----------------+---------+
/// | 4     | 1       | 1           | 4 (LE)   | 8 (LE)         | N       |
/// +-------+---------+-------------+----------+----------------+---------+
///
/// The checksum is a CRC32 of the (compressed) payload; the payload is a
/// JSON document of the tree. Byte keys are encoded as arrays, so the format
/// holds arbitrary binary keys and values.
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compression::{self, CompressionType};
use crate::store::node::{Entry, Node};
use crate::util::{Result, Status};

pub(crate) const MAGIC: [u8; 4] = *b"NSDB";
pub(crate) const FORMAT_VERSION: u8 = 1;
/// Header size: magic(4) + version(1) + compression(1) + checksum(4) + length(8)
pub(crate) const HEADER_SIZE: usize = 18;

#[derive(Serialize, Deserialize)]
struct NodeRepr {
    sequence: u64,
    entries: Vec<(Vec<u8>, EntryRepr)>,
}

#[derive(Serialize, Deserialize)]
enum EntryRepr {
    Value(Vec<u8>),
    Bucket(NodeRepr),
}

fn to_repr(node: &Node) -> NodeRepr {
    NodeRepr {
        sequence: node.sequence(),
        entries: node
            .entries()
            .map(|(key, entry)| {
                let repr = match entry {
                    Entry::Value(value) => EntryRepr::Value(value.clone()),
                    Entry::Bucket(child) => EntryRepr::Bucket(to_repr(child)),
                };
                (key.clone(), repr)
            })
            .collect(),
    }
}

fn from_repr(repr: NodeRepr) -> Node {
    let entries = repr
        .entries
        .into_iter()
        .map(|(key, entry)| {
            let entry = match entry {
                EntryRepr::Value(value) => Entry::Value(value),
                EntryRepr::Bucket(child) => Entry::Bucket(Arc::new(from_repr(child))),
            };
            (key, entry)
        })
        .collect();
    Node::from_parts(repr.sequence, entries)
}

fn checksum_of(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

pub(crate) fn encode(root: &Node, compression: CompressionType) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(&to_repr(root))?;
    let payload = compression::compress(compression, &payload)?;
    let checksum = checksum_of(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(compression.to_u8());
    out.extend_from_slice(&checksum.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

pub(crate) fn decode(data: &[u8]) -> Result<Node> {
    if data.len() < HEADER_SIZE {
        return Err(Status::corruption("snapshot shorter than header"));
    }
    if data[0..4] != MAGIC {
        return Err(Status::corruption("bad snapshot magic"));
    }
    if data[4] != FORMAT_VERSION {
        return Err(Status::corruption(format!(
            "unsupported snapshot format version {}",
            data[4]
        )));
    }
    let compression = CompressionType::from_u8(data[5]).ok_or_else(|| {
        Status::corruption(format!("unknown snapshot compression tag {}", data[5]))
    })?;

    let mut checksum_bytes = [0u8; 4];
    checksum_bytes.copy_from_slice(&data[6..10]);
    let checksum = u32::from_le_bytes(checksum_bytes);

    let mut length_bytes = [0u8; 8];
    length_bytes.copy_from_slice(&data[10..18]);
    let length = u64::from_le_bytes(length_bytes) as usize;

    let payload = &data[HEADER_SIZE..];
    if payload.len() != length {
        return Err(Status::corruption("snapshot payload length mismatch"));
    }
    if checksum_of(payload) != checksum {
        return Err(Status::corruption("snapshot checksum mismatch"));
    }

    let payload = compression::decompress(compression, payload)?;
    let repr: NodeRepr = serde_json::from_slice(&payload)?;
    Ok(from_repr(repr))
}
