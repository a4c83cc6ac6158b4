mod helpers;

use clipscout::config::BlockedPolicy;
use clipscout::video::download::DownloadError;
use helpers::{
    candidate, candidates, pipeline, test_id, Behavior, FakeEmbedder, FakeSearch,
    ScriptedDownloader, TEST_DIMS, TEST_MAX_DURATION,
};
use indicatif::ProgressBar;

#[test]
fn collects_target_in_encounter_order() {
    let search = FakeSearch::new(candidates(12));
    let requests = search.requests.clone();
    let downloader = ScriptedDownloader::default();
    let attempts = downloader.attempts.clone();

    let p = pipeline(search, downloader, FakeEmbedder::new(), BlockedPolicy::Skip);
    let out = p.search_and_embed("omega", 8).unwrap();

    assert_eq!(out.records.len(), 8);
    let ids: Vec<&str> = out.records.iter().map(|r| r.video_id.as_str()).collect();
    let expected: Vec<String> = (0..8).map(test_id).collect();
    assert_eq!(ids, expected);

    assert_eq!(*requests.lock().unwrap(), vec![("omega".to_string(), 12)]);
    // Stops as soon as the target is reached.
    assert_eq!(attempts.lock().unwrap().len(), 8);
    assert_eq!(out.report.fetched, 12);
    assert_eq!(out.report.attempted, 8);
    assert_eq!(out.report.emitted, 8);
}

#[test]
fn overfetch_rounds_up() {
    let search = FakeSearch::new(candidates(20));
    let requests = search.requests.clone();

    let p = pipeline(
        search,
        ScriptedDownloader::default(),
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    p.search_and_embed("omega", 3).unwrap();

    assert_eq!(requests.lock().unwrap()[0].1, 5);
}

#[test]
fn short_video_window_ends_at_its_duration() {
    let mut results = candidates(6);
    results[3] = candidate(3, 50);
    let downloader = ScriptedDownloader::default();
    let attempts = downloader.attempts.clone();

    let p = pipeline(
        FakeSearch::new(results),
        downloader,
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 4).unwrap();

    assert_eq!(out.records[3].end_time, 50.0);
    assert_eq!(out.records[0].end_time, TEST_MAX_DURATION as f64);

    let window = attempts.lock().unwrap()[3].1;
    assert_eq!((window.start(), window.end()), (0, 50));
}

#[test]
fn records_respect_window_and_embedding_invariants() {
    let mut results = candidates(10);
    results[1] = candidate(1, 7);
    results[2] = candidate(2, 121);

    let p = pipeline(
        FakeSearch::new(results),
        ScriptedDownloader::default(),
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 6).unwrap();

    assert!(out.records.len() <= 6);
    for record in &out.records {
        assert!(record.start_time >= 0.0);
        assert!(record.start_time < record.end_time);
        assert!(record.end_time <= TEST_MAX_DURATION as f64);
        assert_eq!(record.video_emb.len(), TEST_DIMS);
        assert_eq!(record.description_emb.len(), TEST_DIMS);
    }
}

#[test]
fn blocked_download_is_skipped_under_skip_policy() {
    let downloader = ScriptedDownloader::default().with(2, Behavior::Blocked);

    let p = pipeline(
        FakeSearch::new(candidates(12)),
        downloader,
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 8).unwrap();

    assert_eq!(out.records.len(), 8);
    assert!(out.records.iter().all(|r| r.video_id != test_id(2)));
    assert_eq!(out.report.skipped_blocked, 1);
    assert_eq!(out.records[2].video_id, test_id(3));
}

#[test]
fn blocked_download_aborts_under_abort_policy() {
    let downloader = ScriptedDownloader::default().with(2, Behavior::Blocked);
    let attempts = downloader.attempts.clone();

    let p = pipeline(
        FakeSearch::new(candidates(12)),
        downloader,
        FakeEmbedder::new(),
        BlockedPolicy::Abort,
    );
    let err = p.search_and_embed("omega", 8).unwrap_err();

    let classified = err.downcast_ref::<DownloadError>().unwrap();
    assert!(matches!(classified, DownloadError::Blocked(_)));
    assert!(classified.is_retriable());
    // Nothing after the blocked candidate was attempted.
    assert_eq!(attempts.lock().unwrap().len(), 3);
}

#[test]
fn invalid_ids_are_rejected_before_download() {
    let mut results = candidates(4);
    results[1].video_id = "short".into();
    let downloader = ScriptedDownloader::default();
    let attempts = downloader.attempts.clone();

    let p = pipeline(
        FakeSearch::new(results),
        downloader,
        FakeEmbedder::new(),
        BlockedPolicy::Abort,
    );
    let out = p.search_and_embed("omega", 3).unwrap();

    assert_eq!(out.records.len(), 3);
    assert_eq!(out.report.skipped_invalid, 1);
    let attempted: Vec<String> = attempts
        .lock()
        .unwrap()
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    assert_eq!(attempted, vec![test_id(0), test_id(2), test_id(3)]);
}

#[test]
fn aborted_run_clears_progress_bar() {
    let bar = ProgressBar::hidden();
    let p = pipeline(
        FakeSearch::new(candidates(12)),
        ScriptedDownloader::default().with(1, Behavior::Blocked),
        FakeEmbedder::new(),
        BlockedPolicy::Abort,
    )
    .with_progress(bar.clone());

    assert!(p.search_and_embed("omega", 8).is_err());
    assert!(bar.is_finished());
    assert_eq!(bar.position(), 2);
}

#[test]
fn vanished_video_is_skipped() {
    let downloader = ScriptedDownloader::default().with(0, Behavior::Invalid);

    let p = pipeline(
        FakeSearch::new(candidates(3)),
        downloader,
        FakeEmbedder::new(),
        BlockedPolicy::Abort,
    );
    let out = p.search_and_embed("omega", 2).unwrap();

    let ids: Vec<&str> = out.records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec![test_id(1), test_id(2)]);
    assert_eq!(out.report.skipped_invalid, 1);
}

#[test]
fn soft_failures_and_embedding_failures_are_skipped() {
    let downloader = ScriptedDownloader::default().with(0, Behavior::Empty);
    let embedder = FakeEmbedder::new().failing_on("Omega clip 1\n");

    let p = pipeline(
        FakeSearch::new(candidates(6)),
        downloader,
        embedder,
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 3).unwrap();

    let ids: Vec<&str> = out.records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec![test_id(2), test_id(3), test_id(4)]);
    assert_eq!(out.report.soft_failures, 1);
    assert_eq!(out.report.embedding_failures, 1);
}

#[test]
fn zero_duration_candidate_is_never_downloaded() {
    let mut results = candidates(3);
    results[0] = candidate(0, 0);
    let downloader = ScriptedDownloader::default();
    let attempts = downloader.attempts.clone();

    let p = pipeline(
        FakeSearch::new(results),
        downloader,
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 2).unwrap();

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.report.skipped_no_window, 1);
    assert!(attempts
        .lock()
        .unwrap()
        .iter()
        .all(|(id, _)| id != &test_id(0)));
}

#[test]
fn fewer_candidates_than_target_is_not_an_error() {
    let p = pipeline(
        FakeSearch::new(candidates(5)),
        ScriptedDownloader::default(),
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 8).unwrap();

    assert_eq!(out.records.len(), 5);
    assert_eq!(out.report.fetched, 5);
}

#[test]
fn empty_search_yields_no_records() {
    let p = pipeline(
        FakeSearch::new(Vec::new()),
        ScriptedDownloader::default(),
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 8).unwrap();
    assert!(out.records.is_empty());
    assert_eq!(out.report.emitted, 0);
}

#[test]
fn zero_target_skips_search() {
    let search = FakeSearch::new(candidates(5));
    let requests = search.requests.clone();

    let p = pipeline(
        search,
        ScriptedDownloader::default(),
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 0).unwrap();

    assert!(out.records.is_empty());
    assert!(requests.lock().unwrap().is_empty());
}

#[test]
fn downloaded_clips_are_released_after_each_candidate() {
    let downloader = ScriptedDownloader::default();
    let issued = downloader.issued.clone();
    let embedder = FakeEmbedder::new().failing_on("Omega clip 2\n");
    let seen = embedder.media_seen.clone();

    let p = pipeline(
        FakeSearch::new(candidates(6)),
        downloader,
        embedder,
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 4).unwrap();
    assert_eq!(out.records.len(), 4);

    // Every clip existed while it was embedded...
    assert!(seen.lock().unwrap().iter().all(|(_, existed)| *existed));
    // ...and none survive the run, including the one whose embedding failed.
    let issued = issued.lock().unwrap();
    assert_eq!(issued.len(), 5);
    assert!(issued.iter().all(|path| !path.exists()));
}

#[test]
fn record_carries_candidate_metadata() {
    let p = pipeline(
        FakeSearch::new(candidates(2)),
        ScriptedDownloader::default(),
        FakeEmbedder::new(),
        BlockedPolicy::Skip,
    );
    let out = p.search_and_embed("omega", 1).unwrap();

    let record = &out.records[0];
    assert_eq!(record.video_id, test_id(0));
    assert_eq!(record.description, "Omega clip 0\n\nBody of clip 0");
    assert_eq!(record.views, 0);
    assert_eq!(record.start_time, 0.0);
    // Text vector from the fake embedder encodes the description length.
    assert_eq!(record.description_emb[0], record.description.len() as f32);
    assert_eq!(record.video_emb[0], 0.5);
}
