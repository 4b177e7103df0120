//! Prefix coder built from a fixed frequency table.

use std::sync::OnceLock;

use crate::error::{EntropyError, EntropyResult};
use crate::table::FREQUENCY_TABLE;
use crate::{EOF_SYMBOL, MAX_SYMBOLS};

/// Sentinel marking a missing child.
const NO_LEAF: u16 = 0xFFFF;

/// Bits resolved per decode table lookup.
const LUT_BITS: u32 = 10;
const LUT_SIZE: usize = 1 << LUT_BITS;
const LUT_MASK: u32 = LUT_SIZE as u32 - 1;

/// A full binary tree over `MAX_SYMBOLS` leaves has this many nodes.
const MAX_NODES: usize = MAX_SYMBOLS * 2 - 1;

/// Decoder refills the accumulator up to this many bits at a time.
const REFILL_BITS: u32 = 24;

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    /// Code bits for a symbol node, least-significant bit first.
    bits: u32,
    /// Code length for a symbol node; 0 marks an interior node.
    num_bits: u32,
    /// Child node indices, `NO_LEAF` on symbol nodes.
    leaves: [u16; 2],
    symbol: u16,
}

/// A static-table prefix coder.
///
/// Construction is deterministic: two coders built from the same frequency
/// table produce bit-identical streams, so peers never exchange code tables.
/// Use [`global`](Self::global) for the shipped table.
#[derive(Debug)]
pub struct Huffman {
    nodes: Vec<Node>,
    /// Maps the next `LUT_BITS` of the stream to either a symbol node or the
    /// interior node reached after consuming all `LUT_BITS`.
    decode_lut: Vec<u16>,
    root: u16,
}

impl Huffman {
    /// Returns the process-wide coder for the shipped frequency table.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Huffman> = OnceLock::new();
        GLOBAL.get_or_init(|| Self::from_frequencies(&FREQUENCY_TABLE))
    }

    /// Builds a coder from a frequency table.
    ///
    /// The EOF slot's frequency is forced to 1 so the terminator is always
    /// among the rarest codes.
    #[must_use]
    pub fn from_frequencies(frequencies: &[u32; MAX_SYMBOLS]) -> Self {
        let mut nodes = vec![Node::default(); MAX_NODES];

        struct Pending {
            node_id: u16,
            frequency: u32,
        }
        let mut pending: Vec<Pending> = Vec::with_capacity(MAX_SYMBOLS);

        for (i, node) in nodes.iter_mut().take(MAX_SYMBOLS).enumerate() {
            // A nonzero num_bits marks symbol nodes for set_bits below.
            *node = Node {
                bits: 0,
                num_bits: u32::MAX,
                leaves: [NO_LEAF; 2],
                symbol: i as u16,
            };
            pending.push(Pending {
                node_id: i as u16,
                frequency: if i == EOF_SYMBOL { 1 } else { frequencies[i] },
            });
        }

        // Repeatedly merge the two rarest nodes. The stable descending sort
        // fixes the tie-break order, which is part of the wire format.
        let mut num_nodes = MAX_SYMBOLS;
        while pending.len() > 1 {
            pending.sort_by(|a, b| b.frequency.cmp(&a.frequency));
            let last = pending.len() - 1;
            nodes[num_nodes] = Node {
                bits: 0,
                num_bits: 0,
                leaves: [pending[last].node_id, pending[last - 1].node_id],
                symbol: 0,
            };
            pending[last - 1].node_id = num_nodes as u16;
            pending[last - 1].frequency += pending[last].frequency;
            pending.pop();
            num_nodes += 1;
        }

        let root = (num_nodes - 1) as u16;
        set_bits(&mut nodes, root as usize, 0, 0);

        let mut decode_lut = vec![root; LUT_SIZE];
        for (pattern, entry) in decode_lut.iter_mut().enumerate() {
            let mut bits = pattern as u32;
            let mut node = root as usize;
            for _ in 0..LUT_BITS {
                node = nodes[node].leaves[(bits & 1) as usize] as usize;
                bits >>= 1;
                if nodes[node].num_bits != 0 {
                    break;
                }
            }
            *entry = node as u16;
        }

        Self {
            nodes,
            decode_lut,
            root,
        }
    }

    /// Compresses `input` into `output` and returns the compressed length.
    ///
    /// The stream is terminated with the EOF symbol and one flush byte, so
    /// even empty input produces output.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyError::OutputOverrun`] if `output` is too small.
    pub fn compress(&self, input: &[u8], output: &mut [u8]) -> EntropyResult<usize> {
        let mut bits: u32 = 0;
        let mut bitcount: u32 = 0;
        let mut written = 0;

        for &byte in input {
            self.load_symbol(byte as usize, &mut bits, &mut bitcount);
            written = flush_bytes(output, written, &mut bits, &mut bitcount)?;
        }
        self.load_symbol(EOF_SYMBOL, &mut bits, &mut bitcount);
        written = flush_bytes(output, written, &mut bits, &mut bitcount)?;

        // The remaining bits always fit one byte; unused high bits are zero.
        if written == output.len() {
            return Err(EntropyError::OutputOverrun {
                capacity: output.len(),
            });
        }
        output[written] = bits as u8;
        Ok(written + 1)
    }

    /// Decompresses `input` into `output` and returns the decompressed
    /// length. Bytes past the EOF symbol are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyError::InputExhausted`] if the stream ends before the
    /// EOF symbol and [`EntropyError::OutputOverrun`] if `output` is too
    /// small.
    pub fn decompress(&self, input: &[u8], output: &mut [u8]) -> EntropyResult<usize> {
        let mut bits: u32 = 0;
        let mut bitcount: u32 = 0;
        let mut src = 0;
        let mut written = 0;

        loop {
            let early = if bitcount >= LUT_BITS {
                Some(self.decode_lut[(bits & LUT_MASK) as usize])
            } else {
                None
            };

            while bitcount < REFILL_BITS && src < input.len() {
                bits |= u32::from(input[src]) << bitcount;
                src += 1;
                bitcount += 8;
            }

            let mut node = match early {
                Some(index) => index as usize,
                None => self.decode_lut[(bits & LUT_MASK) as usize] as usize,
            };

            if self.nodes[node].num_bits != 0 {
                let len = self.nodes[node].num_bits;
                bits >>= len;
                bitcount = bitcount
                    .checked_sub(len)
                    .ok_or(EntropyError::InputExhausted)?;
            } else {
                // Code longer than the lookup window: the table resolved the
                // first LUT_BITS, walk the rest of the tree bit by bit.
                bits >>= LUT_BITS;
                bitcount = bitcount
                    .checked_sub(LUT_BITS)
                    .ok_or(EntropyError::InputExhausted)?;
                loop {
                    node = self.nodes[node].leaves[(bits & 1) as usize] as usize;
                    bitcount = bitcount
                        .checked_sub(1)
                        .ok_or(EntropyError::InputExhausted)?;
                    bits >>= 1;
                    if self.nodes[node].num_bits != 0 {
                        break;
                    }
                    if bitcount == 0 {
                        return Err(EntropyError::InputExhausted);
                    }
                }
            }

            if node == EOF_SYMBOL {
                return Ok(written);
            }
            if written == output.len() {
                return Err(EntropyError::OutputOverrun {
                    capacity: output.len(),
                });
            }
            output[written] = self.nodes[node].symbol as u8;
            written += 1;
        }
    }

    fn load_symbol(&self, symbol: usize, bits: &mut u32, bitcount: &mut u32) {
        let node = &self.nodes[symbol];
        *bits |= node.bits << *bitcount;
        *bitcount += node.num_bits;
    }
}

/// Assigns code bits by walking the tree; child 1 contributes a set bit at
/// its depth, least-significant bit first.
fn set_bits(nodes: &mut [Node], index: usize, bits: u32, depth: u32) {
    let leaves = nodes[index].leaves;
    if leaves[1] != NO_LEAF {
        set_bits(nodes, leaves[1] as usize, bits | (1 << depth), depth + 1);
    }
    if leaves[0] != NO_LEAF {
        set_bits(nodes, leaves[0] as usize, bits, depth + 1);
    }
    if nodes[index].num_bits != 0 {
        nodes[index].bits = bits;
        nodes[index].num_bits = depth;
    }
}

/// Drains whole bytes from the accumulator into `output`.
fn flush_bytes(
    output: &mut [u8],
    mut written: usize,
    bits: &mut u32,
    bitcount: &mut u32,
) -> EntropyResult<usize> {
    while *bitcount >= 8 {
        if written == output.len() {
            return Err(EntropyError::OutputOverrun {
                capacity: output.len(),
            });
        }
        output[written] = (*bits & 0xFF) as u8;
        written += 1;
        *bits >>= 8;
        *bitcount -= 8;
    }
    Ok(written)
}
