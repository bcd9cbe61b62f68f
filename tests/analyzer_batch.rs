//! Batch-level analyzer properties: determinism, the score/reliability
//! pairing, and the corpus → details file → store round trip.

use gaplens::analyzer::{AnalyzerParams, run_batch};
use gaplens::analyzer::corpus::{MovieReviews, ReviewCorpus};
use gaplens::details::DetailsStore;
use gaplens::util::text::movie_key;

fn review_block(texts: &[&str], repeat: usize) -> Vec<String> {
    texts
        .iter()
        .cycle()
        .take(texts.len() * repeat)
        .map(|t| (*t).to_string())
        .collect()
}

fn fixture_corpus() -> ReviewCorpus {
    ReviewCorpus {
        movies: vec![
            MovieReviews {
                imdb_id: "tt0109830".to_string(),
                title: Some("Forrest Gump".to_string()),
                imdb_reviews: review_block(
                    &[
                        "heartwarming journey across american history",
                        "tom hanks delivers an iconic sincere performance",
                        "the running scenes and soundtrack define an era",
                    ],
                    3,
                ),
                douban_reviews: review_block(
                    &[
                        "励志的人生故事让人流泪",
                        "羽毛飘落的开场镜头令人难忘",
                        "跑步穿越美国的桥段充满诗意",
                    ],
                    3,
                ),
            },
            MovieReviews {
                imdb_id: "tt0111161".to_string(),
                title: Some("The Shawshank Redemption".to_string()),
                imdb_reviews: review_block(&["hope prison friendship redemption"], 6),
                douban_reviews: review_block(&["希望与自由的救赎故事"], 6),
            },
            MovieReviews {
                imdb_id: "tt0000404".to_string(),
                title: Some("Too Quiet".to_string()),
                imdb_reviews: vec!["lone review".to_string()],
                douban_reviews: vec![],
            },
        ],
    }
}

#[test]
fn batch_is_deterministic_for_a_fixed_seed() {
    let params = AnalyzerParams::default();
    let corpus = fixture_corpus();

    let first = run_batch(&params, &corpus);
    let second = run_batch(&params, &corpus);

    // run_id and timestamp differ per run; the analysis must not.
    assert_eq!(first.movies, second.movies);
}

#[test]
fn batch_preserves_corpus_order_and_keys() {
    let params = AnalyzerParams::default();
    let corpus = fixture_corpus();

    let details = run_batch(&params, &corpus);
    assert_eq!(details.movies.len(), 3);
    assert_eq!(details.movies[0].movie_key, movie_key("tt0109830"));
    assert_eq!(details.movies[1].movie_key, movie_key("tt0111161"));
    assert_eq!(details.movies[2].movie_key, movie_key("tt0000404"));
}

#[test]
fn every_record_keeps_the_pairing_invariant() {
    let params = AnalyzerParams::default();
    let details = run_batch(&params, &fixture_corpus());

    for record in &details.movies {
        assert_eq!(
            record.score.is_none(),
            record.reliability.is_none(),
            "pairing broken for {}",
            record.movie_key
        );
        if let Some(score) = record.score {
            assert!((0.0..=100.0).contains(&score));
        }
        if let Some(reliability) = record.reliability {
            assert!((0.0..=1.0).contains(&reliability));
        }
        for theme in &record.themes {
            assert!((0.0..=1.0).contains(&theme.imdb_share));
            assert!((0.0..=1.0).contains(&theme.douban_share));
            let expected_gap = theme.douban_share - theme.imdb_share;
            assert!((theme.share_gap - expected_gap).abs() < 1e-12);
        }
    }
}

#[test]
fn movies_below_the_evidence_floor_stay_unscored() {
    let params = AnalyzerParams::default();
    let details = run_batch(&params, &fixture_corpus());

    let quiet = &details.movies[2];
    assert_eq!(quiet.score, None);
    assert_eq!(quiet.reliability, None);
    assert!(quiet.themes.is_empty());
}

#[test]
fn details_file_round_trips_into_a_store() {
    let params = AnalyzerParams::default();
    let details = run_batch(&params, &fixture_corpus());

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("details.json");
    details.write(&path).expect("write details");

    let store = DetailsStore::load(&path).expect("store loads");
    assert_eq!(store.len(), 3);

    let gump = store
        .get(&movie_key("tt0109830"))
        .expect("analyzed film present");
    assert!(gump.outcome.is_some());

    let quiet = store
        .get(&movie_key("tt0000404"))
        .expect("floored film present");
    assert!(quiet.outcome.is_none());
}
