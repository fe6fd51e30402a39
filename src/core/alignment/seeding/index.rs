//! Read k-mer index, template hits and co-linear chaining.

use std::collections::HashMap;

use crate::core::alignment::actions::template_base;

/// Bits per residue in a packed k-mer. Wide enough for protein codes.
const RESIDUE_BITS: u32 = 5;

/// Exact k-mer match between read and template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeedHit {
    pub read_pos: usize,
    pub template_pos: i64,
    /// Offset from the expected diagonal: `template_pos - read_pos - start`.
    pub diagonal: i32,
}

/// Maximal stretch of read on one diagonal covered by chained seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub end: usize,
    pub diagonal: i32,
}

/// Iterate the packed value of every k-mer free of unknown residues.
fn packed_kmers(seq: &[u8], k: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
    let mask = if k as u32 * RESIDUE_BITS >= 64 {
        u64::MAX
    } else {
        (1u64 << (k as u32 * RESIDUE_BITS)) - 1
    };
    let mut value = 0u64;
    let mut valid = 0usize;
    seq.iter().enumerate().filter_map(move |(i, &b)| {
        if b == 0 {
            valid = 0;
            value = 0;
            return None;
        }
        value = ((value << RESIDUE_BITS) | b as u64) & mask;
        valid += 1;
        (valid >= k).then(|| (i + 1 - k, value))
    })
}

/// Occurrence table of the read's k-mers, reused across calls.
#[derive(Debug, Default)]
pub struct KmerIndex {
    k: usize,
    table: HashMap<u64, (u32, usize)>,
}

impl KmerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, read: &[u8], k: usize) {
        self.k = k;
        self.table.clear();
        for (pos, kmer) in packed_kmers(read, k) {
            let entry = self.table.entry(kmer).or_insert((0, pos));
            entry.0 += 1;
            entry.1 = pos;
        }
    }

    /// Read position of `kmer` when it occurs exactly once in the read.
    pub fn unique(&self, kmer: u64) -> Option<usize> {
        match self.table.get(&kmer) {
            Some(&(1, pos)) => Some(pos),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Hits in `template[start - shift, start + read_len + shift)` whose
    /// diagonal lies within the band, sorted by read then template position.
    pub fn find_hits(
        &self,
        read_len: usize,
        template: &[u8],
        start: i32,
        shift: i32,
        hits: &mut Vec<SeedHit>,
    ) {
        hits.clear();
        let lo = (start as i64 - shift as i64).max(0);
        let hi = (start as i64 + read_len as i64 + shift as i64).min(template.len() as i64);
        if hi - lo < self.k as i64 {
            return;
        }
        let window = &template[lo as usize..hi as usize];
        for (offset, kmer) in packed_kmers(window, self.k) {
            let Some(read_pos) = self.unique(kmer) else {
                continue;
            };
            let template_pos = lo + offset as i64;
            let diagonal = (template_pos - read_pos as i64 - start as i64) as i32;
            if diagonal.abs() <= shift {
                hits.push(SeedHit {
                    read_pos,
                    template_pos,
                    diagonal,
                });
            }
        }
        hits.sort_unstable();
    }
}

/// Best co-linear chain of hits.
///
/// A hit may follow another when both coordinates increase, the diagonals
/// differ by at most `max_indel`, and seeds on different diagonals do not
/// overlap in the read. Each diagonal change costs one.
pub fn chain_hits(hits: &[SeedHit], k: usize, max_indel: u32) -> Vec<SeedHit> {
    if hits.is_empty() {
        return Vec::new();
    }
    let mut score = vec![1i32; hits.len()];
    let mut prev: Vec<Option<usize>> = vec![None; hits.len()];
    for j in 0..hits.len() {
        let hj = hits[j];
        for i in 0..j {
            let hi = hits[i];
            let same = hi.diagonal == hj.diagonal;
            if hi.read_pos < hj.read_pos
                && hi.template_pos < hj.template_pos
                && hi.diagonal.abs_diff(hj.diagonal) <= max_indel
                && (same || hj.read_pos >= hi.read_pos + k)
            {
                let v = score[i] + if same { 1 } else { 0 };
                if v > score[j] {
                    score[j] = v;
                    prev[j] = Some(i);
                }
            }
        }
    }
    let mut best = 0;
    for j in 1..hits.len() {
        if score[j] > score[best] {
            best = j;
        }
    }
    let mut chain = Vec::new();
    let mut cur = Some(best);
    while let Some(j) = cur {
        chain.push(hits[j]);
        cur = prev[j];
    }
    chain.reverse();
    chain
}

/// Merge chained seeds into per-diagonal blocks, then trim each block so
/// that it starts after its predecessor ends in both read and template.
pub fn blocks_from_chain(chain: &[SeedHit], k: usize) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::with_capacity(chain.len());
    for hit in chain {
        match merged.last_mut() {
            Some(last) if last.diagonal == hit.diagonal && hit.read_pos <= last.end => {
                last.end = last.end.max(hit.read_pos + k);
            }
            _ => merged.push(Block {
                start: hit.read_pos,
                end: hit.read_pos + k,
                diagonal: hit.diagonal,
            }),
        }
    }

    let mut blocks: Vec<Block> = Vec::with_capacity(merged.len());
    for mut block in merged {
        if let Some(prev) = blocks.last() {
            let need = prev.end + (prev.diagonal - block.diagonal).max(0) as usize;
            block.start = block.start.max(need);
            if block.start >= block.end {
                continue;
            }
        }
        blocks.push(block);
    }
    blocks
}

/// Grow every block along its diagonal while bases match, never crossing into
/// the space a neighbour needs.
pub fn extend_blocks(blocks: &mut [Block], read: &[u8], template: &[u8], start: i32) {
    let matches = |i: usize, d: i32| {
        let t = template_base(template, start as i64 + i as i64 + d as i64);
        read[i] != 0 && read[i] == t
    };
    for bi in 0..blocks.len() {
        let d = blocks[bi].diagonal;
        let left_limit = if bi == 0 {
            0
        } else {
            let prev = blocks[bi - 1];
            prev.end + (prev.diagonal - d).max(0) as usize
        };
        while blocks[bi].start > left_limit && matches(blocks[bi].start - 1, d) {
            blocks[bi].start -= 1;
        }
        let right_limit = if bi + 1 == blocks.len() {
            read.len()
        } else {
            let next = blocks[bi + 1];
            next.start.saturating_sub((d - next.diagonal).max(0) as usize)
        };
        while blocks[bi].end < right_limit && matches(blocks[bi].end, d) {
            blocks[bi].end += 1;
        }
    }
}
