//! Pagination properties over a synthetic snapshot: concatenating every
//! page reproduces the filtered set exactly once, in a stable order.

use std::collections::HashSet;

use gaplens::catalog::model::MovieSeed;
use gaplens::catalog::query::{ListQuery, SortKey, execute};
use gaplens::catalog::store::CatalogSnapshot;
use gaplens::details::DetailsStore;

fn synthetic_snapshot(count: usize) -> CatalogSnapshot {
    let seeds = (0..count)
        .map(|i| MovieSeed {
            title: format!("Film {i:03}"),
            year: (i % 11 != 0).then_some(1950 + (i as i32 * 7) % 70),
            region: Some(["US", "CN", "HK", "FR"][i % 4].to_string()),
            imdb_id: Some(format!("tt{i:07}")),
            imdb_rating: (i % 5 != 0).then_some(5.0 + (i % 50) as f64 / 10.0),
            douban_rating: (i % 7 != 0).then_some(4.0 + (i % 60) as f64 / 10.0),
            imdb_votes: Some((i as i64 * 137) % 10_000),
            douban_votes: Some((i as i64 * 61) % 8_000),
            ..MovieSeed::default()
        })
        .collect();

    CatalogSnapshot::build(seeds, DetailsStore::empty())
}

fn collect_all_pages(
    snapshot: &CatalogSnapshot,
    base: &ListQuery,
    page_size: usize,
) -> Vec<String> {
    let mut collected = Vec::new();
    let mut page = 1;
    loop {
        let query = ListQuery {
            page,
            page_size,
            ..base.clone()
        };
        let result = execute(snapshot, &query).expect("query runs");
        let done = result.items.len() < page_size;
        collected.extend(
            result
                .items
                .iter()
                .map(|movie| movie.imdb_id.clone().expect("fixture has ids")),
        );
        if done || collected.len() >= result.total {
            assert_eq!(result.total, collected.len());
            break;
        }
        page += 1;
    }
    collected
}

#[test]
fn pages_cover_the_filtered_set_exactly_once() {
    let snapshot = synthetic_snapshot(157);

    for sort in [
        SortKey::VotesDesc,
        SortKey::GapDesc,
        SortKey::GapAsc,
        SortKey::ScoreDesc,
        SortKey::YearAsc,
    ] {
        let base = ListQuery {
            sort,
            ..ListQuery::default()
        };

        let all_at_once = execute(
            &snapshot,
            &ListQuery {
                page_size: 200,
                ..base.clone()
            },
        )
        .expect("query runs");
        let expected: Vec<String> = all_at_once
            .items
            .iter()
            .map(|movie| movie.imdb_id.clone().expect("fixture has ids"))
            .collect();

        let paged = collect_all_pages(&snapshot, &base, 13);

        assert_eq!(paged, expected, "sort {sort:?} must page consistently");

        let unique: HashSet<&String> = paged.iter().collect();
        assert_eq!(unique.len(), paged.len(), "no duplicates under {sort:?}");
    }
}

#[test]
fn filtered_pagination_respects_total() {
    let snapshot = synthetic_snapshot(157);

    let base = ListQuery {
        region: Some("cn".to_string()),
        year_min: Some(1950),
        year_max: Some(2005),
        sort: SortKey::GapDesc,
        ..ListQuery::default()
    };

    let paged = collect_all_pages(&snapshot, &base, 7);
    let full = execute(
        &snapshot,
        &ListQuery {
            page_size: 200,
            ..base.clone()
        },
    )
    .expect("query runs");

    assert_eq!(paged.len(), full.total);
    for movie in &full.items {
        assert_eq!(movie.region.as_deref(), Some("CN"));
        let year = movie.year.expect("range filter excludes missing years");
        assert!((1950..=2005).contains(&year));
    }
}
