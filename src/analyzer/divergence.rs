//! Per-film divergence scoring.
//!
//! Both audiences' reviews are embedded in one TF-IDF space and
//! clustered together; each audience then gets a distribution over the
//! shared clusters. The film's score is the total-variation distance
//! between those two distributions scaled to 0–100, and reliability
//! combines evidence volume with the agreement between two independently
//! seeded clustering runs.

use crate::details::{DivergenceOutcome, MovieDetails, ThemeCluster};
use crate::util::text::{hash_text, movie_key};

use super::AnalyzerParams;
use super::corpus::MovieReviews;
use super::kmeans::KMeans;
use super::tfidf::TfIdfModel;
use super::tokenize::tokenize;

/// Seed offset for the stability re-run.
const STABILITY_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Analyze one film. Never fails: a film without enough evidence gets
/// `outcome: None` and no themes.
#[must_use]
pub fn analyze_movie(params: &AnalyzerParams, movie: &MovieReviews) -> MovieDetails {
    let key = movie_key(&movie.imdb_id);

    let imdb_docs = collect_docs(&movie.imdb_reviews, params.max_docs_per_side);
    let douban_docs = collect_docs(&movie.douban_reviews, params.max_docs_per_side);

    let below_floor = MovieDetails {
        movie_key: key.clone(),
        imdb_id: Some(movie.imdb_id.clone()),
        outcome: None,
        themes: Vec::new(),
    };

    if imdb_docs.len() < params.min_docs_per_side.max(1)
        || douban_docs.len() < params.min_docs_per_side.max(1)
    {
        return below_floor;
    }

    let imdb_total = imdb_docs.len();
    let douban_total = douban_docs.len();

    let mut docs = imdb_docs;
    docs.extend(douban_docs);

    let model = TfIdfModel::fit(&docs, params.min_df);
    if model.is_empty() {
        return below_floor;
    }

    let vectors: Vec<Vec<f32>> = docs.iter().map(|doc| model.vectorize(doc)).collect();

    let k = (docs.len() / 8)
        .clamp(2, params.k_max.max(2))
        .min(docs.len());
    let film_seed = params.seed ^ hash_text(&key);

    let primary = KMeans::with_seed(&vectors, k, params.max_iterations, film_seed);
    let shadow = KMeans::with_seed(
        &vectors,
        k,
        params.max_iterations,
        film_seed ^ STABILITY_SEED_MIX,
    );
    let stability = co_assignment_agreement(&primary.assignments, &shadow.assignments);

    let cluster_count = primary.centroids.len();
    let mut imdb_counts = vec![0_usize; cluster_count];
    let mut douban_counts = vec![0_usize; cluster_count];
    for (i, &cluster) in primary.assignments.iter().enumerate() {
        if i < imdb_total {
            imdb_counts[cluster] += 1;
        } else {
            douban_counts[cluster] += 1;
        }
    }

    let imdb_shares: Vec<f64> = imdb_counts
        .iter()
        .map(|&count| count as f64 / imdb_total as f64)
        .collect();
    let douban_shares: Vec<f64> = douban_counts
        .iter()
        .map(|&count| count as f64 / douban_total as f64)
        .collect();

    let total_variation = 0.5
        * imdb_shares
            .iter()
            .zip(&douban_shares)
            .map(|(imdb, douban)| (imdb - douban).abs())
            .sum::<f64>();
    let score = (100.0 * total_variation).clamp(0.0, 100.0);

    let smaller_side = imdb_total.min(douban_total);
    let volume = (smaller_side as f64 / params.reliability_saturation.max(1) as f64).min(1.0);
    let reliability = (volume * stability).clamp(0.0, 1.0);

    let themes = build_themes(
        params,
        &model,
        &vectors,
        &primary.assignments,
        imdb_total,
        &imdb_shares,
        &douban_shares,
    );

    MovieDetails {
        movie_key: key,
        imdb_id: Some(movie.imdb_id.clone()),
        outcome: Some(DivergenceOutcome { score, reliability }),
        themes,
    }
}

fn collect_docs(reviews: &[String], cap: usize) -> Vec<Vec<String>> {
    reviews
        .iter()
        .map(|review| tokenize(review))
        .filter(|tokens| !tokens.is_empty())
        .take(cap)
        .collect()
}

/// Fraction of document pairs whose together-or-apart relation is the
/// same in both clusterings. 1.0 means the partition is stable under a
/// different initialization.
fn co_assignment_agreement(a: &[usize], b: &[usize]) -> f64 {
    let n = a.len();
    if n < 2 {
        return 1.0;
    }

    let mut agreements = 0_usize;
    let mut pairs = 0_usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let together_a = a[i] == a[j];
            let together_b = b[i] == b[j];
            if together_a == together_b {
                agreements += 1;
            }
            pairs += 1;
        }
    }

    agreements as f64 / pairs as f64
}

#[allow(clippy::too_many_arguments)]
fn build_themes(
    params: &AnalyzerParams,
    model: &TfIdfModel,
    vectors: &[Vec<f32>],
    assignments: &[usize],
    imdb_total: usize,
    imdb_shares: &[f64],
    douban_shares: &[f64],
) -> Vec<ThemeCluster> {
    let cluster_count = imdb_shares.len();

    // Clusters with no meaningful share on either side fall below the
    // significance floor and are not reported.
    let mut kept: Vec<usize> = (0..cluster_count)
        .filter(|&c| {
            imdb_shares[c] >= params.min_cluster_share
                || douban_shares[c] >= params.min_cluster_share
        })
        .collect();
    kept.sort_by(|&a, &b| {
        let mass_a = imdb_shares[a] + douban_shares[a];
        let mass_b = imdb_shares[b] + douban_shares[b];
        mass_b.total_cmp(&mass_a).then_with(|| a.cmp(&b))
    });

    kept.iter()
        .enumerate()
        .map(|(position, &cluster)| {
            let imdb_terms = salient_terms(
                params, model, vectors, assignments, cluster, imdb_total, true,
            );
            let douban_terms = salient_terms(
                params, model, vectors, assignments, cluster, imdb_total, false,
            );

            ThemeCluster {
                cluster_id: position as u32,
                imdb_share: imdb_shares[cluster],
                douban_share: douban_shares[cluster],
                share_gap: douban_shares[cluster] - imdb_shares[cluster],
                imdb_terms,
                douban_terms,
            }
        })
        .collect()
}

/// Top terms by summed TF-IDF mass within one cluster for one audience.
/// Ties break lexicographically via the model's sorted term order.
fn salient_terms(
    params: &AnalyzerParams,
    model: &TfIdfModel,
    vectors: &[Vec<f32>],
    assignments: &[usize],
    cluster: usize,
    imdb_total: usize,
    imdb_side: bool,
) -> Vec<String> {
    let mut mass = vec![0.0_f32; model.len()];
    for (i, vector) in vectors.iter().enumerate() {
        if assignments[i] != cluster || (i < imdb_total) != imdb_side {
            continue;
        }
        for (term, weight) in mass.iter_mut().zip(vector) {
            *term += weight;
        }
    }

    let mut ranked: Vec<(usize, f32)> = mass
        .into_iter()
        .enumerate()
        .filter(|(_, weight)| *weight > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(params.top_terms)
        .map(|(index, _)| model.term(index).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviews(imdb: &[&str], douban: &[&str]) -> MovieReviews {
        MovieReviews {
            imdb_id: "tt0000042".to_string(),
            title: Some("Fixture".to_string()),
            imdb_reviews: imdb.iter().map(|r| (*r).to_string()).collect(),
            douban_reviews: douban.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    fn repeated(text: &str, count: usize) -> Vec<&str> {
        std::iter::repeat_n(text, count).collect()
    }

    #[test]
    fn too_few_reviews_yield_no_outcome() {
        let params = AnalyzerParams::default();
        let movie = reviews(&["sparse signal here"], &["另一条评论内容"]);

        let details = analyze_movie(&params, &movie);
        assert!(details.outcome.is_none());
        assert!(details.themes.is_empty());
        assert!(details.movie_key.starts_with("mk-"));
    }

    #[test]
    fn analysis_is_deterministic() {
        let params = AnalyzerParams::default();
        let imdb = repeated("explosive car chase stunts adrenaline ride", 6);
        let douban = repeated("细腻的情感刻画与诗意镜头", 6);
        let movie = reviews(&imdb, &douban);

        let first = analyze_movie(&params, &movie);
        let second = analyze_movie(&params, &movie);
        assert_eq!(first, second);
    }

    #[test]
    fn disjoint_audiences_score_at_the_ceiling() {
        let params = AnalyzerParams::default();
        let imdb = repeated("explosive car chase stunts adrenaline ride", 6);
        let douban = repeated("tender romance poetry longing nostalgia mood", 6);
        let movie = reviews(&imdb, &douban);

        let details = analyze_movie(&params, &movie);
        let outcome = details.outcome.expect("enough evidence");
        assert!((outcome.score - 100.0).abs() < 1e-9);
        assert!(outcome.reliability > 0.0);

        // Two pure clusters, each owned by one audience.
        assert_eq!(details.themes.len(), 2);
        for theme in &details.themes {
            let owned_by_one_side = (theme.imdb_share == 1.0 && theme.douban_share == 0.0)
                || (theme.imdb_share == 0.0 && theme.douban_share == 1.0);
            assert!(owned_by_one_side, "unexpected shares: {theme:?}");
            assert!((theme.share_gap - (theme.douban_share - theme.imdb_share)).abs() < 1e-12);
        }
    }

    #[test]
    fn identical_audiences_score_zero() {
        let params = AnalyzerParams::default();
        let text = "haunting score beautiful cinematography patient editing";
        let imdb = repeated(text, 6);
        let douban = repeated(text, 6);
        let movie = reviews(&imdb, &douban);

        let details = analyze_movie(&params, &movie);
        let outcome = details.outcome.expect("enough evidence");
        assert_eq!(outcome.score, 0.0);

        assert_eq!(details.themes.len(), 1);
        let theme = &details.themes[0];
        assert_eq!(theme.cluster_id, 0);
        assert_eq!(theme.share_gap, 0.0);
        assert_eq!(theme.imdb_terms, theme.douban_terms);
    }

    #[test]
    fn term_ties_break_lexicographically() {
        let params = AnalyzerParams::default();
        let text = "zebra acting";
        let imdb = repeated(text, 6);
        let douban = repeated(text, 6);
        let movie = reviews(&imdb, &douban);

        let details = analyze_movie(&params, &movie);
        let theme = &details.themes[0];
        assert_eq!(theme.imdb_terms, vec!["acting", "zebra"]);
    }

    #[test]
    fn reliability_grows_with_evidence_volume() {
        let params = AnalyzerParams::default();
        let imdb_text = "explosive car chase stunts adrenaline ride";
        let douban_text = "tender romance poetry longing nostalgia mood";

        let small = analyze_movie(
            &params,
            &reviews(&repeated(imdb_text, 6), &repeated(douban_text, 6)),
        );
        let large = analyze_movie(
            &params,
            &reviews(&repeated(imdb_text, 30), &repeated(douban_text, 30)),
        );

        let small_reliability = small.outcome.expect("scored").reliability;
        let large_reliability = large.outcome.expect("scored").reliability;
        assert!(large_reliability > small_reliability);
    }

    #[test]
    fn shares_stay_within_unit_range() {
        let params = AnalyzerParams::default();
        let movie = reviews(
            &[
                "explosive car chase stunts adrenaline ride",
                "explosive stunts everywhere pure adrenaline",
                "car chase sequences thrilling stunts",
                "soundtrack pounding adrenaline chase",
                "stunts and explosive chase choreography",
                "adrenaline fueled car stunts",
            ],
            &[
                "细腻的情感刻画与诗意镜头",
                "诗意镜头下的情感铺陈",
                "情感细腻镜头诗意",
                "刻画入微的情感诗意",
                "镜头语言诗意而情感充沛",
                "情感与诗意交织的镜头",
            ],
        );

        let details = analyze_movie(&params, &movie);
        assert!(details.outcome.is_some());
        for theme in &details.themes {
            assert!((0.0..=1.0).contains(&theme.imdb_share));
            assert!((0.0..=1.0).contains(&theme.douban_share));
        }
    }

    #[test]
    fn agreement_is_total_on_identical_partitions() {
        let a = vec![0, 0, 1, 1];
        assert_eq!(co_assignment_agreement(&a, &a), 1.0);

        // Same partition under a label swap still agrees pairwise.
        let relabeled = vec![1, 1, 0, 0];
        assert_eq!(co_assignment_agreement(&a, &relabeled), 1.0);
    }

    #[test]
    fn agreement_drops_when_pairs_split() {
        let a = vec![0, 0, 1, 1];
        let b = vec![0, 1, 0, 1];
        let agreement = co_assignment_agreement(&a, &b);
        assert!(agreement < 1.0);
    }
}
