// tests/consensus_properties.rs
// Election determinism and flag correctness over generated candidate sets.

use award_consensus::analyze::{Candidate, CategoryKind, Layout, Relation};
use award_consensus::canonical::{Canonicalizer, PhraseTally};
use award_consensus::consensus::{Voter, VoterParams};
use rand::{rngs::StdRng, seq::IndexedRandom, seq::SliceRandom, Rng, SeedableRng};

const CATEGORIES: &[&str] = &[
    "Best Director",
    "best director",
    "Best Original Song",
    "Best Motion Picture - Drama",
    "Best Motion Picture Drama",
    "Best Screenplay",
];

const ENTITIES: &[&str] = &[
    "Ben Affleck",
    "ben affleck",
    "Ang Lee",
    "Skyfall",
    "Argo",
    "Lincoln",
    "Quentin Tarantino",
    "Django Unchained",
];

fn cand(cat: &str, ent: &str) -> Candidate {
    Candidate {
        category_phrase: cat.to_string(),
        category_kind: CategoryKind::Unknown,
        entity_phrase: ent.to_string(),
        layout: Layout::CategoryRight,
        relation: Relation::Winner,
        rule_id: "wins".to_string(),
        source_message_id: "m".to_string(),
    }
}

fn random_candidates(rng: &mut StdRng) -> Vec<Candidate> {
    (0..rng.random_range(0..80))
        .map(|_| {
            cand(
                CATEGORIES.choose(rng).copied().unwrap_or("Best Director"),
                ENTITIES.choose(rng).copied().unwrap_or("Argo"),
            )
        })
        .collect()
}

#[test]
fn low_confidence_flag_matches_share() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..100 {
        let cands = random_candidates(&mut rng);
        let cats: PhraseTally = cands.iter().map(|c| c.category_phrase.as_str()).collect();
        let ents: PhraseTally = cands.iter().map(|c| c.entity_phrase.as_str()).collect();
        let cat_idx = Canonicalizer::categories().build(&cats);
        let ent_idx = Canonicalizer::entities().build(&ents);

        let threshold = rng.random_range(0.0..=1.0);
        let voter = Voter::new(VoterParams {
            low_confidence_share: threshold,
            ..VoterParams::default()
        });
        for r in voter.elect(&cands, &cat_idx, &ent_idx) {
            assert_eq!(r.low_confidence_flag, r.winner_share < threshold);
            assert!(r.total_votes >= r.votes_for_winner);
            assert!(r.runner_ups.len() <= 5);
            assert!(r.runner_ups.iter().all(|v| v.votes <= r.votes_for_winner));
            let votes: u64 = r.runner_ups.iter().map(|v| v.votes).sum::<u64>() + r.votes_for_winner;
            assert!(votes <= r.total_votes);
        }
    }
}

#[test]
fn election_is_deterministic_under_replay_order() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..30 {
        let mut cands = random_candidates(&mut rng);
        let cats: PhraseTally = cands.iter().map(|c| c.category_phrase.as_str()).collect();
        let ents: PhraseTally = cands.iter().map(|c| c.entity_phrase.as_str()).collect();
        let cat_idx = Canonicalizer::categories().build(&cats);
        let ent_idx = Canonicalizer::entities().build(&ents);

        let voter = Voter::default();
        let first = voter.elect(&cands, &cat_idx, &ent_idx);
        assert_eq!(first, voter.elect(&cands, &cat_idx, &ent_idx));

        cands.shuffle(&mut rng);
        assert_eq!(first, voter.elect(&cands, &cat_idx, &ent_idx));

        // results are sorted by category
        for pair in first.windows(2) {
            assert!(pair[0].category < pair[1].category);
        }
    }
}

#[test]
fn case_variants_vote_together() {
    let cands = vec![
        cand("Best Director", "Ben Affleck"),
        cand("best director", "ben affleck"),
        cand("Best Director", "Ang Lee"),
    ];
    let cats: PhraseTally = cands.iter().map(|c| c.category_phrase.as_str()).collect();
    let ents: PhraseTally = cands.iter().map(|c| c.entity_phrase.as_str()).collect();
    let r = Voter::default().elect(
        &cands,
        &Canonicalizer::categories().build(&cats),
        &Canonicalizer::entities().build(&ents),
    );
    assert_eq!(r.len(), 1);
    assert_eq!(r[0].category, "Best Director");
    assert_eq!(r[0].winner, "Ben Affleck");
    assert_eq!(r[0].votes_for_winner, 2);
    assert!(!r[0].low_confidence_flag);
}
