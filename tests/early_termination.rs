// A tighter bound may only turn a result into the sentinel, never into a
// different alignment.

use ferrous_edit::core::compute::encoding::{encode_dna, reverse_complement};
use ferrous_edit::{
    ActionSequence, AlignRequest, AlignerChain, AlignerConfig, AlignerFactory, AlignerKind, Arm, ChainStats,
    Penalties, SplitParams, NO_ALIGNMENT,
};
use proptest::prelude::*;

const INDEL_READ: &str = "gtttttgtttatgtgctgacatgactgacgatcgatgctagctgatcgaca";
const CG_READ: &str = "ATAAAAAGGCGACATGCCAATGTGTTTCAACTTTC";
const CG_TEMPLATE: &str = "gggggggataAAAAAGGCGACATGCCAATGTGTCGCCTTTTTCAACTTTCCGATTAA";

fn chain() -> AlignerChain {
    AlignerFactory::new(AlignerConfig::default()).unwrap().chain()
}

fn clipping_chain(limit: i32) -> AlignerChain {
    let mut config = AlignerConfig::default();
    config.soft_clip_limit = Some(limit);
    AlignerFactory::new(config).unwrap().chain()
}

fn split_chain() -> AlignerChain {
    let mut config = AlignerConfig::default();
    config.penalties = Penalties::new(1, 1, 2, 1).unwrap();
    config.split = SplitParams::complete_genomics();
    config.chain.order = vec![AlignerKind::SplitRead];
    AlignerFactory::new(config).unwrap().chain()
}

fn run(chain: &mut AlignerChain, req: &AlignRequest, rc: bool, bound: i32) -> ActionSequence {
    let mut stats = ChainStats::new();
    chain.align(&req.with_max_score(bound), rc, &mut stats)
}

/// Check every bound in `bounds` against the unbounded result of `req`.
fn assert_consistent_with(chain: &mut AlignerChain, req: &AlignRequest, rc: bool, bounds: &[i32]) -> ActionSequence {
    let loose = run(chain, req, rc, NO_ALIGNMENT);
    assert!(!loose.is_no_alignment());
    let s = loose.score();
    for &bound in bounds {
        let tight = run(chain, req, rc, bound);
        if bound <= s {
            assert!(tight.is_no_alignment(), "bound {bound} <= {s} returned {tight}");
            assert_eq!(tight.template_start(), req.template_start);
        } else {
            assert_eq!(tight, loose, "bound {bound} > {s}");
        }
    }
    loose
}

fn assert_consistent(read: &[u8], template: &[u8], start: i32, shift: u32, bounds: &[i32]) -> ActionSequence {
    let req = AlignRequest::new(read, template, start).with_max_shift(shift);
    assert_consistent_with(&mut chain(), &req, false, bounds)
}

fn sweep(score: i32) -> Vec<i32> {
    let mut bounds: Vec<i32> = (-1..=score + 12).collect();
    bounds.extend([score + 100, NO_ALIGNMENT - 1]);
    bounds
}

#[test]
fn test_exact_match() {
    let read = encode_dna(b"ACGTA");
    let template = encode_dna(b"TTTTTACGTATC");
    let a = assert_consistent(&read, &template, 5, 2, &sweep(0));
    assert_eq!(a.run_string(), "5=");
}

#[test]
fn test_substitution() {
    let read = encode_dna(b"ACGTTACGA");
    let template = encode_dna(b"TTACGTCACGATT");
    let a = assert_consistent(&read, &template, 2, 3, &sweep(9));
    assert_eq!((a.score(), a.run_string().as_str()), (9, "4=1X4="));
}

#[test]
fn test_deletion() {
    let read = encode_dna(b"ACGTTGCAAGTCCATG");
    let template = encode_dna(b"TTACGTTGCAGGAAGTCCATGAA");
    let a = assert_consistent(&read, &template, 2, 4, &sweep(22));
    assert_eq!((a.score(), a.run_string().as_str()), (22, "7=3D9="));
}

#[test]
fn test_single_insertion() {
    let read = encode_dna(INDEL_READ.as_bytes());
    let mut t = INDEL_READ.as_bytes().to_vec();
    t.remove(20);
    let template = encode_dna(&t);
    let a = assert_consistent(&read, &template, 0, 5, &sweep(20));
    assert_eq!((a.score(), a.run_string().as_str()), (20, "20=1I30="));
}

#[test]
fn test_unknown_in_read() {
    let read = encode_dna(b"ACGNTACGA");
    let template = encode_dna(b"TTACGTCACGATT");
    let a = assert_consistent(&read, &template, 2, 3, &sweep(14));
    assert_eq!((a.score(), a.run_string().as_str()), (14, "3=1R1X4="));
}

/// Apply `(position, kind)` edits to a copy of `seq`: 0 substitutes, 1
/// deletes, 2 inserts.
fn mutate(seq: &[u8], edits: &[(usize, u8)]) -> Vec<u8> {
    let mut out = seq.to_vec();
    for &(pos, kind) in edits {
        let pos = pos % out.len();
        match kind {
            0 => out[pos] = out[pos] % 4 + 1,
            1 if out.len() > 8 => {
                out.remove(pos);
            }
            _ => out.insert(pos, (pos % 4) as u8 + 1),
        }
    }
    out
}

#[test]
fn test_reverse_strand() {
    let read = reverse_complement(&encode_dna(b"ACGTTACGA"));
    let template = encode_dna(b"TTACGTCACGATT");
    let req = AlignRequest::new(&read, &template, 2).with_max_shift(3);
    let a = assert_consistent_with(&mut chain(), &req, true, &sweep(9));
    assert_eq!(a.score(), 9);

    let read = reverse_complement(&encode_dna(b"ACGTTGCAAGTCCATG"));
    let template = encode_dna(b"TTACGTTGCAGGAAGTCCATGAA");
    let req = AlignRequest::new(&read, &template, 2).with_max_shift(4);
    let a = assert_consistent_with(&mut chain(), &req, true, &sweep(22));
    assert_eq!(a.score(), 22);
}

#[test]
fn test_soft_clipped_chain() {
    // 1=1X10= at 2 clips to 2S10= at 4 with score 0.
    let read = encode_dna(b"AGGTTACGATCC");
    let template = encode_dna(b"TTACGTTACGATCCAA");
    let req = AlignRequest::new(&read, &template, 2);
    let a = assert_consistent_with(&mut clipping_chain(1), &req, false, &sweep(0));
    assert_eq!((a.score(), a.template_start(), a.run_string().as_str()), (0, 4, "2S10="));

    // An interior mismatch stays scored.
    let read = encode_dna(b"ACGTTACGA");
    let template = encode_dna(b"TTACGTCACGATT");
    let req = AlignRequest::new(&read, &template, 2).with_max_shift(3);
    let a = assert_consistent_with(&mut clipping_chain(1), &req, false, &sweep(9));
    assert_eq!(a.run_string(), "4=1X4=");

    let rc_read = reverse_complement(&read);
    let req = AlignRequest::new(&rc_read, &template, 2).with_max_shift(3);
    let a = assert_consistent_with(&mut clipping_chain(1), &req, true, &sweep(9));
    assert_eq!(a.score(), 9);
}

#[test]
fn test_split_chain_left_arm() {
    let read = encode_dna(CG_READ.as_bytes());
    let template = encode_dna(CG_TEMPLATE.as_bytes());
    let req = AlignRequest::new(&read, &template, 10)
        .with_max_shift(2)
        .with_arm(Some(Arm::Left));
    let a = assert_consistent_with(&mut split_chain(), &req, false, &sweep(1));
    assert_eq!((a.score(), a.run_string().as_str()), (1, "1=1X3=2B18=7N10="));
}

#[test]
fn test_split_chain_right_arm_and_reverse_strand() {
    let read = encode_dna(CG_READ.as_bytes());
    let template = encode_dna(CG_TEMPLATE.as_bytes());

    // The left-arm alignment ends at 50.
    let req = AlignRequest::new(&read, &template, 15)
        .with_max_shift(2)
        .with_arm(Some(Arm::Right));
    let mut split = split_chain();
    let loose = run(&mut split, &req, false, NO_ALIGNMENT);
    assert_consistent_with(&mut split, &req, false, &sweep(loose.score()));

    let rc_read = reverse_complement(&read);
    for arm in [Arm::Left, Arm::Right] {
        let start = if arm == Arm::Left { 10 } else { 15 };
        let req = AlignRequest::new(&rc_read, &template, start)
            .with_max_shift(2)
            .with_arm(Some(arm));
        let loose = run(&mut split, &req, true, NO_ALIGNMENT);
        assert_consistent_with(&mut split, &req, true, &sweep(loose.score()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_bound_never_changes_the_alignment(
        template in "[ACGT]{60,90}",
        offset in 6usize..14,
        len in 20usize..40,
        edits in prop::collection::vec((0usize..64, 0u8..3), 0..4),
        shift in 2u32..8,
        cut in 0i32..200,
        rc in any::<bool>(),
        clip in prop::option::of(0i32..4),
    ) {
        let template = encode_dna(template.as_bytes());
        let len = len.min(template.len() - offset);
        let mutated = mutate(&template[offset..offset + len], &edits);
        let read = if rc { reverse_complement(&mutated) } else { mutated };
        let req = AlignRequest::new(&read, &template, offset as i32).with_max_shift(shift);

        let mut chain = match clip {
            Some(limit) => clipping_chain(limit),
            None => chain(),
        };
        let loose = run(&mut chain, &req, rc, NO_ALIGNMENT);
        prop_assert!(!loose.is_no_alignment());
        let s = loose.score();

        let at = run(&mut chain, &req, rc, s);
        prop_assert!(at.is_no_alignment());
        let below = run(&mut chain, &req, rc, s - cut.min(s));
        prop_assert!(below.is_no_alignment());
        let above = run(&mut chain, &req, rc, s + 1 + cut);
        prop_assert_eq!(above, loose);
    }
}
