// Randomised comparison of the seed-and-extend aligner with the exact
// banded aligner on reads carrying a few substitutions and short indels.

use ferrous_edit::core::alignment::banded::BandedAligner;
use ferrous_edit::core::alignment::seeding::{SeedStats, SeededAligner};
use ferrous_edit::{AlignRequest, Penalties, SeedParams, Validator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TRIALS: usize = 300;
const FLANK: usize = 20;

fn base(rng: &mut StdRng) -> u8 {
    rng.gen_range(1..=4u8)
}

/// A read taken from the middle of a random sequence, and a template made
/// from the same sequence with a few edits applied away from the ends.
fn case(rng: &mut StdRng) -> (Vec<u8>, Vec<u8>) {
    let n = rng.gen_range(30..120);
    let source: Vec<u8> = (0..n + 2 * FLANK).map(|_| base(rng)).collect();
    let mut read = source[FLANK..FLANK + n].to_vec();
    let mut template = source;
    for _ in 0..rng.gen_range(0..=4) {
        let pos = rng.gen_range(FLANK + 1..template.len() - FLANK - 2);
        match rng.gen_range(0..4) {
            0 | 1 => template[pos] = base(rng),
            2 => {
                let len = rng.gen_range(1..=3);
                template.drain(pos..pos + len);
            }
            _ => {
                for _ in 0..rng.gen_range(1..=3) {
                    template.insert(pos, base(rng));
                }
            }
        }
    }
    if rng.gen_bool(0.2) {
        let pos = rng.gen_range(0..n);
        read[pos] = 0;
    }
    (read, template)
}

#[test]
fn test_seeded_results_are_valid_and_never_beat_the_band() {
    let penalties = Penalties::default();
    let validator = Validator::new(penalties);
    let mut seeded = SeededAligner::new(penalties, SeedParams::default());
    let mut exact = BandedAligner::new(penalties);
    let mut stats = SeedStats::default();
    let mut rng = StdRng::seed_from_u64(11);

    let mut optimal = 0usize;
    for trial in 0..TRIALS {
        let (read, template) = case(&mut rng);
        let shift = rng.gen_range(3..=8);
        let req = AlignRequest::new(&read, &template, FLANK as i32).with_max_shift(shift);
        let best = exact.align(&req);
        let Some(a) = seeded.align(&req, &mut stats) else {
            continue;
        };
        assert!(!a.is_no_alignment(), "trial {trial}: unbounded call returned the sentinel");
        assert_eq!(
            validator.validate_actions(&a, &read, &template, i32::MAX),
            Ok(()),
            "trial {trial}: {a}"
        );
        assert!(
            (a.template_start() - FLANK as i32).abs() <= shift as i32,
            "trial {trial}: start {} outside the band",
            a.template_start()
        );
        assert!(
            a.score() >= best.score(),
            "trial {trial}: seeded {} beat the exact band optimum {}",
            a.score(),
            best.score()
        );
        if a.score() == best.score() {
            optimal += 1;
        }
    }

    assert_eq!(stats.calls, TRIALS as u64);
    assert_eq!(stats.too_short, 0);
    assert!(optimal * 2 >= TRIALS, "only {optimal} of {TRIALS} seeded results were optimal");
    assert!(stats.failures() < TRIALS as u64 / 2);
}

#[test]
fn test_seeded_respects_the_bound() {
    let penalties = Penalties::default();
    let mut seeded = SeededAligner::new(penalties, SeedParams::default());
    let mut stats = SeedStats::default();
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..50 {
        let (read, template) = case(&mut rng);
        let req = AlignRequest::new(&read, &template, FLANK as i32);
        let Some(a) = seeded.align(&req, &mut stats) else {
            continue;
        };
        let at = seeded.align(&req.with_max_score(a.score()), &mut stats);
        assert!(at.map_or(true, |r| r.is_no_alignment()));
        let above = seeded.align(&req.with_max_score(a.score() + 1), &mut stats);
        assert_eq!(above.as_ref(), Some(&a));
    }
}
